//! Client Session
//!
//! The in-memory session (token + user) and the persistent slot the
//! token survives in between runs.
//!
//! A [`Session`] can only hold a user together with the token that user
//! was validated with; clearing always drops both.

mod error;
mod storage;

pub use error::{StorageError, StorageResult};
pub use storage::{LocalStorage, MemoryStorage, TokenStore, STORAGE_FILE, TOKEN_KEY};

use crate::api::User;

/// Auth token plus the user it was validated for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    /// Empty session
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Token read from storage but not yet validated by the server
    pub fn unverified(token: String) -> Self {
        Self {
            token: Some(token),
            user: None,
        }
    }

    /// Token the server accepted, with the user it returned
    pub fn authenticated(token: String, user: User) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Drop token and user together
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            phone: "0712345678".to_string(),
            balance: 100.0,
            role: Role::User,
            mpesa_name: Some("Jane".to_string()),
        }
    }

    #[test]
    fn test_session_states() {
        let anon = Session::anonymous();
        assert!(!anon.is_authenticated());
        assert_eq!(anon.token(), None);

        let pending = Session::unverified("tok".to_string());
        assert_eq!(pending.token(), Some("tok"));
        assert!(!pending.is_authenticated());

        let auth = Session::authenticated("tok".to_string(), user());
        assert!(auth.is_authenticated());
        assert_eq!(auth.user().unwrap().phone, "0712345678");
    }

    #[test]
    fn test_clear_drops_both() {
        let mut session = Session::authenticated("tok".to_string(), user());
        session.clear();
        assert_eq!(session, Session::anonymous());

        session.clear();
        assert_eq!(session, Session::anonymous());
    }
}
