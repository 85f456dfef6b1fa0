//! Who may do what with a list. Items inherit the permissions of their list.

use crate::model::List;
use crate::session::Session;

/// Public lists are visible to everyone; private ones only to their owner.
pub fn can_view_list(list: &List, session: &Session) -> bool {
    list.is_public || owns(list, session)
}

pub fn can_edit_list(list: &List, session: &Session) -> bool {
    owns(list, session)
}

/// Creating lists needs a logged-in user with a verified email address.
pub fn can_create_list(session: &Session) -> bool {
    session.is_authenticated && session.email_verified
}

fn owns(list: &List, session: &Session) -> bool {
    matches!((list.created_by, session.user()), (Some(owner), Some(user)) if owner == user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    fn list_owned_by(owner: UserId, is_public: bool) -> List {
        let mut list = List::new("Rivers");
        list.created_by = Some(owner);
        list.is_public = is_public;
        list
    }

    #[test]
    fn test_owner_can_view_and_edit_private_list() {
        let owner = UserId::new();
        let session = Session::logged_in(owner, "ada", true);
        let list = list_owned_by(owner, false);
        assert!(can_view_list(&list, &session));
        assert!(can_edit_list(&list, &session));
    }

    #[test]
    fn test_stranger_sees_public_but_cannot_edit() {
        let list = list_owned_by(UserId::new(), true);
        let session = Session::logged_in(UserId::new(), "bob", true);
        assert!(can_view_list(&list, &session));
        assert!(!can_edit_list(&list, &session));
        assert!(!can_view_list(&list_owned_by(UserId::new(), false), &session));
    }

    #[test]
    fn test_anonymous_never_owns() {
        let mut list = List::new("Orphan");
        list.created_by = None;
        assert!(!can_edit_list(&list, &Session::anonymous()));
    }

    #[test]
    fn test_create_needs_verified_email() {
        let user = UserId::new();
        assert!(can_create_list(&Session::logged_in(user, "ada", true)));
        assert!(!can_create_list(&Session::logged_in(user, "ada", false)));
        assert!(!can_create_list(&Session::anonymous()));
    }
}
