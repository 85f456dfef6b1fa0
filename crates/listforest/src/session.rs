use serde::{Deserialize, Serialize};

use crate::model::UserId;

/// Who is using the client. The token itself belongs to the transport; the
/// session only knows whether one is held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Option<UserId>,
    pub username: String,
    pub is_authenticated: bool,
    pub email_verified: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in(user_id: UserId, username: impl Into<String>, email_verified: bool) -> Self {
        Self {
            user_id: Some(user_id),
            username: username.into(),
            is_authenticated: true,
            email_verified,
        }
    }

    /// The current user, if logged in.
    pub fn user(&self) -> Option<UserId> {
        if self.is_authenticated {
            self.user_id
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_user() {
        assert_eq!(Session::anonymous().user(), None);
    }

    #[test]
    fn test_logged_in_user() {
        let id = UserId::new();
        let session = Session::logged_in(id, "ada", true);
        assert_eq!(session.user(), Some(id));
        assert!(session.email_verified);
    }
}
