//! Resource routing table.
//!
//! # Responsibility
//! - Classify a [`ResourceUri`] into one [`ResourceKind`] by structural
//!   pattern matching.
//! - Declare which [`Operation`]s each kind accepts.
//!
//! # Invariants
//! - Tables are immutable once built; the dispatcher receives one explicitly.
//! - Routes are tried in insertion order and the first match wins.
//! - A `#` segment matches ASCII digits only and must fit in `i64`.

use super::uri::ResourceUri;
use crate::model::tables::{TableSpec, CONTACTS, USERS};
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Classification outcome for a resource identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// One contact addressed by numeric id.
    SingleContact,
    /// The current user's contacts.
    Contacts,
    /// Every user account.
    Users,
}

/// Dispatchable CRUD operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleContact => "single_contact",
            Self::Contacts => "contacts",
            Self::Users => "users",
        }
    }

    /// Mutations are narrowed per kind: collections only accept inserts and
    /// single rows only accept update/delete.
    pub fn allows(self, operation: Operation) -> bool {
        match operation {
            Operation::Query => true,
            Operation::Insert => matches!(self, Self::Contacts | Self::Users),
            Operation::Update | Operation::Delete => matches!(self, Self::SingleContact),
        }
    }

    /// Backing table for this kind.
    pub fn table(self) -> TableSpec {
        match self {
            Self::SingleContact | Self::Contacts => CONTACTS,
            Self::Users => USERS,
        }
    }

    fn addresses_row(self) -> bool {
        matches!(self, Self::SingleContact)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    pub kind: ResourceKind,
    /// Row id captured from a `#` segment.
    pub id: Option<i64>,
}

/// Route pattern rejected while building a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    InvalidPattern { pattern: String, reason: &'static str },
}

impl Display for RouteTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern `{pattern}`: {reason}")
            }
        }
    }
}

impl Error for RouteTableError {}

#[derive(Debug, Clone)]
struct Route {
    pattern: String,
    matcher: Regex,
    kind: ResourceKind,
}

/// Immutable identifier-to-kind table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

/// Collects `(pattern, kind)` pairs before compilation.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<(String, ResourceKind)>,
}

impl RouteTableBuilder {
    /// Adds a route. Pattern segments are literals or `#` for a row id.
    pub fn route(mut self, pattern: impl Into<String>, kind: ResourceKind) -> Self {
        self.routes.push((pattern.into(), kind));
        self
    }

    pub fn build(self) -> Result<RouteTable, RouteTableError> {
        let routes = self
            .routes
            .into_iter()
            .map(|(pattern, kind)| {
                let matcher = compile_pattern(&pattern, kind)?;
                Ok(Route {
                    pattern,
                    matcher,
                    kind,
                })
            })
            .collect::<Result<Vec<_>, RouteTableError>>()?;
        Ok(RouteTable { routes })
    }
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Default address-book scheme: `/contacts/#`, `/contacts`, `/users`.
    pub fn address_book() -> Self {
        Self::builder()
            .route("/contacts/#", ResourceKind::SingleContact)
            .route("/contacts", ResourceKind::Contacts)
            .route("/users", ResourceKind::Users)
            .build()
            .expect("built-in route patterns are valid")
    }

    /// Classifies `uri`, or `None` when no route matches.
    pub fn classify(&self, uri: &ResourceUri) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            let captures = route.matcher.captures(uri.as_str())?;
            let id = match captures.get(1) {
                Some(segment) => Some(segment.as_str().parse::<i64>().ok()?),
                None => None,
            };
            Some(RouteMatch {
                kind: route.kind,
                id,
            })
        })
    }

    /// Registered patterns in match order.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, ResourceKind)> {
        self.routes
            .iter()
            .map(|route| (route.pattern.as_str(), route.kind))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::address_book()
    }
}

fn compile_pattern(pattern: &str, kind: ResourceKind) -> Result<Regex, RouteTableError> {
    let invalid = |reason| RouteTableError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let uri = ResourceUri::parse(pattern).map_err(|_| invalid("must be an absolute path"))?;
    let segments: Vec<&str> = uri.segments().collect();
    let wildcard_count = segments.iter().filter(|segment| **segment == "#").count();
    if wildcard_count > 1 {
        return Err(invalid("at most one `#` segment is allowed"));
    }
    if kind.addresses_row() != (wildcard_count == 1) {
        return Err(invalid("`#` is required for single-row kinds and forbidden otherwise"));
    }

    let body = segments
        .iter()
        .map(|segment| match *segment {
            "#" => "([0-9]+)".to_string(),
            literal => regex::escape(literal),
        })
        .collect::<Vec<_>>()
        .join("/");
    Regex::new(&format!("^/{body}$")).map_err(|_| invalid("pattern does not compile"))
}
