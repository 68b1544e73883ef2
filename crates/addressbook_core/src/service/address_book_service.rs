//! Address-book use-case service.
//!
//! # Responsibility
//! - Provide account and contact entry points for application screens.
//! - Translate typed records to resource dispatches and back.
//!
//! # Invariants
//! - Service APIs never bypass the dispatcher's routing and kind gating.
//! - Contact APIs require an active session and only touch rows it owns.

use crate::model::contact::Contact;
use crate::model::tables::{contact_columns, user_columns, ID};
use crate::model::user::User;
use crate::provider::{
    AddressBookProvider, Comparison, ProviderError, ProviderResult, QueryRequest, ResourceUri,
    Selection, SortKey,
};
use crate::session::Session;

const USERS_PATH: &str = "/users";
const CONTACTS_PATH: &str = "/contacts";

/// Use-case wrapper over an [`AddressBookProvider`].
pub struct AddressBookService<'p> {
    provider: &'p AddressBookProvider,
    users: ResourceUri,
    contacts: ResourceUri,
}

impl<'p> AddressBookService<'p> {
    pub fn new(provider: &'p AddressBookProvider) -> ProviderResult<Self> {
        Ok(Self {
            provider,
            users: ResourceUri::parse(USERS_PATH)?,
            contacts: ResourceUri::parse(CONTACTS_PATH)?,
        })
    }

    /// Creates a user account and returns its id.
    pub fn create_account(&self, user: &User) -> ProviderResult<i64> {
        let new_uri = self
            .provider
            .insert(&Session::anonymous(), &self.users, &user.to_values())?;
        id_from_uri(&new_uri)
    }

    /// Login lookup: id of the user with exactly these credentials.
    pub fn find_user_id(&self, username: &str, password: &str) -> ProviderResult<Option<i64>> {
        let request = QueryRequest::new()
            .with_projection([ID])
            .with_selection(Selection::text_eq(user_columns::USERNAME, username).and(
                user_columns::PASSWORD,
                Comparison::Eq,
                password.to_string(),
            ))
            .sorted_by(SortKey::asc(ID));
        let mut cursor = self
            .provider
            .query(&Session::anonymous(), &self.users, &request)?;
        Ok(cursor.next().and_then(|row| row.id()))
    }

    /// Whether `username` is already taken.
    pub fn username_exists(&self, username: &str) -> ProviderResult<bool> {
        let request = QueryRequest::new()
            .with_projection([ID])
            .with_selection(Selection::text_eq(user_columns::USERNAME, username));
        let cursor = self
            .provider
            .query(&Session::anonymous(), &self.users, &request)?;
        Ok(cursor.remaining() > 0)
    }

    /// Every account, without password material.
    pub fn list_users(&self) -> ProviderResult<Vec<User>> {
        let request = QueryRequest::new()
            .with_projection([ID, user_columns::USERNAME])
            .sorted_by(SortKey::asc(ID));
        let cursor = self
            .provider
            .query(&Session::anonymous(), &self.users, &request)?;
        Ok(cursor.map(|row| User::from_row(&row)).collect())
    }

    /// Adds a contact owned by the session user and returns its id.
    pub fn add_contact(&self, session: &Session, contact: &Contact) -> ProviderResult<i64> {
        let new_uri = self
            .provider
            .insert(session, &self.contacts, &contact.to_values())?;
        id_from_uri(&new_uri)
    }

    /// Session user's contacts ordered by name.
    pub fn list_contacts(&self, session: &Session) -> ProviderResult<Vec<Contact>> {
        let request = QueryRequest::new()
            .sorted_by(SortKey::asc(contact_columns::NAME))
            .sorted_by(SortKey::asc(ID));
        let cursor = self.provider.query(session, &self.contacts, &request)?;
        Ok(cursor.map(|row| Contact::from_row(&row)).collect())
    }

    pub fn get_contact(&self, session: &Session, id: i64) -> ProviderResult<Option<Contact>> {
        let uri = self.contacts.with_appended_id(id);
        let request = QueryRequest::new().with_selection(owner_selection(session, &uri)?);
        let mut cursor = self.provider.query(session, &uri, &request)?;
        Ok(cursor.next().map(|row| Contact::from_row(&row)))
    }

    /// Replaces every field of contact `id`. Returns `false` when no owned row matched.
    pub fn update_contact(
        &self,
        session: &Session,
        id: i64,
        contact: &Contact,
    ) -> ProviderResult<bool> {
        let uri = self.contacts.with_appended_id(id);
        let selection = owner_selection(session, &uri)?;
        let mut values = contact.to_values();
        // Ownership is not transferable through an edit.
        if let Some(user_id) = session.user_id() {
            values.put_integer(contact_columns::USER_ID, user_id);
        }
        let changed = self
            .provider
            .update(session, &uri, &values, Some(&selection))?;
        Ok(changed > 0)
    }

    /// Deletes contact `id`. Returns `false` when no owned row matched.
    pub fn delete_contact(&self, session: &Session, id: i64) -> ProviderResult<bool> {
        let uri = self.contacts.with_appended_id(id);
        let selection = owner_selection(session, &uri)?;
        let removed = self.provider.delete(session, &uri, Some(&selection))?;
        Ok(removed > 0)
    }
}

fn owner_selection(session: &Session, uri: &ResourceUri) -> ProviderResult<Selection> {
    let user_id = session
        .user_id()
        .ok_or_else(|| ProviderError::NoActiveSession { uri: uri.clone() })?;
    Ok(Selection::eq(contact_columns::USER_ID, user_id))
}

fn id_from_uri(uri: &ResourceUri) -> ProviderResult<i64> {
    uri.last_segment()
        .parse::<i64>()
        .map_err(|_| ProviderError::InsertFailed {
            uri: uri.clone(),
            source: None,
        })
}
