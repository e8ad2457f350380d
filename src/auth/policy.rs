use uuid::Uuid;

use crate::auth::{AuthError, CurrentUser};

/// Everything a caller can ask the system to do, with the owning user
/// attached where ownership matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewBooking { owner: Uuid },
    CancelBooking { owner: Uuid },
    ManageBookings,
    ManageServices,
    ViewAllUsers,
    ViewPayments,
}

/// Single authorization gate, invoked before every role- or
/// ownership-restricted operation. Admins may do everything; a regular
/// user may only touch bookings they own.
pub fn authorize(caller: &CurrentUser, action: Action) -> Result<(), AuthError> {
    if caller.is_admin() {
        return Ok(());
    }

    match action {
        Action::ViewBooking { owner } | Action::CancelBooking { owner } if owner == caller.id => {
            Ok(())
        }
        _ => Err(AuthError::InsufficientPermissions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use assert_matches::assert_matches;

    fn caller(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            name: "caller".to_string(),
            email: "caller@example.com".to_string(),
            role,
            email_verified: true,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn admin_is_allowed_everything() {
        let admin = caller(UserRole::Admin);
        let someone_else = Uuid::new_v4();

        assert!(authorize(&admin, Action::ManageServices).is_ok());
        assert!(authorize(&admin, Action::ManageBookings).is_ok());
        assert!(authorize(&admin, Action::ViewAllUsers).is_ok());
        assert!(authorize(&admin, Action::ViewPayments).is_ok());
        assert!(authorize(&admin, Action::ViewBooking { owner: someone_else }).is_ok());
        assert!(authorize(&admin, Action::CancelBooking { owner: someone_else }).is_ok());
    }

    #[test]
    fn user_may_only_touch_own_bookings() {
        let user = caller(UserRole::User);

        assert!(authorize(&user, Action::ViewBooking { owner: user.id }).is_ok());
        assert!(authorize(&user, Action::CancelBooking { owner: user.id }).is_ok());

        let other = Uuid::new_v4();
        assert_matches!(
            authorize(&user, Action::ViewBooking { owner: other }),
            Err(AuthError::InsufficientPermissions)
        );
        assert_matches!(
            authorize(&user, Action::CancelBooking { owner: other }),
            Err(AuthError::InsufficientPermissions)
        );
    }

    #[test]
    fn user_is_denied_admin_actions() {
        let user = caller(UserRole::User);

        for action in [
            Action::ManageBookings,
            Action::ManageServices,
            Action::ViewAllUsers,
            Action::ViewPayments,
        ] {
            assert_matches!(
                authorize(&user, action),
                Err(AuthError::InsufficientPermissions)
            );
        }
    }
}
