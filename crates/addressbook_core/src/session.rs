//! Caller session context.
//!
//! Contacts-collection operations are scoped to the signed-in user. The scope
//! travels with every dispatch call as a [`Session`] value instead of living in
//! process-wide state.

use serde::{Deserialize, Serialize};

/// Identity of the caller issuing a dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user_id: Option<i64>,
}

impl Session {
    /// No user signed in. Only `/users` and `/contacts/{id}` are usable.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Current user id, if a user is signed in.
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn is_active(&self) -> bool {
        self.user_id.is_some()
    }
}
