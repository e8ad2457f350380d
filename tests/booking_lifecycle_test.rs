use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use service_booking::auth::{authorize, Action, AuthError, CurrentUser, UserRole};
use service_booking::models::{BookingStatus, PaymentStatus};

fn admin() -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        name: "Admin User".to_string(),
        email: "admin@service.com".to_string(),
        role: UserRole::Admin,
        email_verified: true,
        jti: "admin-jti".to_string(),
    }
}

fn customer() -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        email: "user@service.com".to_string(),
        role: UserRole::User,
        email_verified: true,
        jti: "user-jti".to_string(),
    }
}

/// The full cash-booking walkthrough: book, approve, fail to cancel,
/// complete, settle payment.
#[test]
fn ac_maintenance_walkthrough() {
    let admin = admin();
    let customer = customer();

    // Admin manages the catalog; the customer may not.
    assert!(authorize(&admin, Action::ManageServices).is_ok());
    assert_matches!(
        authorize(&customer, Action::ManageServices),
        Err(AuthError::InsufficientPermissions)
    );

    // Customer books: the booking starts pending/pending with the price
    // snapshot taken at creation.
    let service_price = 75.00_f64;
    let total_amount = service_price;
    let mut status = BookingStatus::Pending;
    let mut payment = PaymentStatus::Pending;

    // Admin approves.
    assert!(authorize(&admin, Action::ManageBookings).is_ok());
    assert!(status.can_transition_to(BookingStatus::Approved));
    status = BookingStatus::Approved;

    // Customer tries to cancel: ownership allows the attempt, but the
    // lifecycle refuses because the booking is no longer pending.
    assert!(authorize(&customer, Action::CancelBooking { owner: customer.id }).is_ok());
    assert!(!status.can_transition_to(BookingStatus::Cancelled));

    // Admin completes.
    assert!(status.can_transition_to(BookingStatus::Completed));
    status = BookingStatus::Completed;
    assert!(status.is_terminal());

    // Cash received after completion; payment state is orthogonal.
    assert_eq!(payment, PaymentStatus::Pending);
    payment = PaymentStatus::Paid;
    assert_eq!(payment, PaymentStatus::Paid);

    // A later price change on the service never touches the snapshot.
    let new_service_price = 95.00_f64;
    assert_ne!(total_amount, new_service_price);
    assert_eq!(total_amount, 75.00);
}

#[test]
fn nothing_returns_to_pending() {
    for state in [
        BookingStatus::Approved,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ] {
        assert!(!state.can_transition_to(BookingStatus::Pending));
    }
}

#[test]
fn rejection_is_final() {
    let rejected = BookingStatus::Rejected;
    assert!(rejected.is_terminal());
    assert!(!rejected.can_transition_to(BookingStatus::Approved));
    assert!(!rejected.can_transition_to(BookingStatus::Completed));
}

#[test]
fn only_owner_or_admin_touches_a_booking() {
    let admin = admin();
    let stranger = customer();
    let customer = customer();

    let owner = customer.id;

    assert!(authorize(&customer, Action::ViewBooking { owner }).is_ok());
    assert!(authorize(&admin, Action::ViewBooking { owner }).is_ok());
    assert_matches!(
        authorize(&stranger, Action::ViewBooking { owner }),
        Err(AuthError::InsufficientPermissions)
    );
}

#[test]
fn payment_views_are_admin_only() {
    let customer = customer();
    assert_matches!(
        authorize(&customer, Action::ViewPayments),
        Err(AuthError::InsufficientPermissions)
    );
    assert!(authorize(&admin(), Action::ViewPayments).is_ok());
}

#[test]
fn status_strings_match_the_wire_format() {
    assert_eq!(BookingStatus::Pending.as_str(), "pending");
    assert_eq!(BookingStatus::Approved.as_str(), "approved");
    assert_eq!(BookingStatus::Rejected.as_str(), "rejected");
    assert_eq!(BookingStatus::Cancelled.as_str(), "cancelled");
    assert_eq!(BookingStatus::Completed.as_str(), "completed");
    assert_eq!(PaymentStatus::Pending.as_str(), "pending");
    assert_eq!(PaymentStatus::Paid.as_str(), "paid");
}
