use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{authorize, Action, CurrentUser};
use crate::error::ApiError;
use crate::models::{
    parse_booking_time, Booking, BookingDetailRow, BookingListQuery, BookingResponse,
    BookingStatus, CompleteBookingRequest, CreateBookingRequest, MarkPaymentRequest, Paginated,
    PaymentSummary, PaymentSummaryQuery, Service, UpdateStatusRequest,
};

const PAGE_SIZE: u32 = 15;

const DETAIL_SELECT: &str = "SELECT b.id, b.user_id, b.service_id, b.booking_date, \
     b.booking_time, b.status, b.payment_status, b.total_amount, b.notes, b.admin_notes, \
     b.created_at, b.updated_at, \
     s.name AS service_name, s.category AS service_category, s.price AS service_price, \
     s.duration_minutes AS service_duration_minutes, \
     u.name AS user_name, u.email AS user_email \
     FROM bookings b \
     JOIN services s ON s.id = b.service_id \
     JOIN users u ON u.id = b.user_id";

/// Cash payment details echoed back when a booking is created.
#[derive(Debug, Serialize)]
pub struct PaymentInfo {
    pub method: &'static str,
    pub amount: f64,
    pub currency: &'static str,
    pub note: &'static str,
}

#[derive(Debug)]
pub enum MarkPaymentOutcome {
    Marked(BookingResponse),
    AlreadyPaid,
}

const DUPLICATE_SLOT_MESSAGE: &str =
    "You already have a booking for this service at the same date and time.";

/// Regular users are scoped to their own bookings; admins see everything.
fn owner_scope(caller: &CurrentUser) -> Option<Uuid> {
    caller.is_user().then_some(caller.id)
}

/// The partial unique index on live bookings turns a lost create race into
/// a unique violation; surface it as the duplicate-slot refusal.
fn duplicate_slot_error(error: sqlx::Error) -> ApiError {
    match error.as_database_error() {
        Some(db_error) if matches!(db_error.kind(), sqlx::error::ErrorKind::UniqueViolation) => {
            ApiError::policy(DUPLICATE_SLOT_MESSAGE)
        }
        _ => ApiError::Database(error),
    }
}

fn settlement_note(received_amount: f64) -> String {
    format!("Cash payment received - Amount: ${received_amount}")
}

fn transition_refused(current: &str, requested: &str) -> ApiError {
    ApiError::policy(format!(
        "Only pending bookings can be {requested}; this booking is {current}."
    ))
}

/// The booking lifecycle engine. Status transitions run as conditional
/// single-statement updates so two concurrent admin actions cannot both
/// win; the duplicate-slot rule is additionally backed by a partial unique
/// index.
#[derive(Debug, Clone)]
pub struct BookingService {
    db: PgPool,
}

impl BookingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a booking for the caller: active service, date not in the
    /// past, no live duplicate for the same slot. The service price is
    /// snapshotted into `total_amount` and never re-derived.
    pub async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateBookingRequest,
    ) -> Result<(BookingResponse, PaymentInfo), ApiError> {
        let booking_time = parse_booking_time(&request.booking_time)
            .ok_or_else(|| ApiError::bad_request("The booking time must match the format H:i."))?;

        if request.booking_date < Utc::now().date_naive() {
            return Err(ApiError::bad_request(
                "The booking date must be today or later.",
            ));
        }

        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(request.service_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ApiError::NotFound("Service"))?;

        if !service.is_active {
            return Err(ApiError::policy("Service is not available for booking."));
        }

        let duplicate = sqlx::query(
            "SELECT 1 FROM bookings
             WHERE user_id = $1 AND service_id = $2
               AND booking_date = $3 AND booking_time = $4
               AND status IN ('pending', 'approved')",
        )
        .bind(caller.id)
        .bind(service.id)
        .bind(request.booking_date)
        .bind(booking_time)
        .fetch_optional(&self.db)
        .await?;

        if duplicate.is_some() {
            return Err(ApiError::policy(DUPLICATE_SLOT_MESSAGE));
        }

        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings
                 (id, user_id, service_id, booking_date, booking_time,
                  status, payment_status, total_amount, notes)
             VALUES ($1, $2, $3, $4, $5, 'pending', 'pending', $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(caller.id)
        .bind(service.id)
        .bind(request.booking_date)
        .bind(booking_time)
        .bind(service.price)
        .bind(&request.notes)
        .fetch_one(&self.db)
        .await
        .map_err(duplicate_slot_error)?;

        let detail = self.fetch_detail(booking.id).await?;
        let payment_info = PaymentInfo {
            method: "cash",
            amount: service.price,
            currency: "USD",
            note: "Payment will be collected in cash during or after service completion.",
        };

        Ok((detail, payment_info))
    }

    pub async fn get(
        &self,
        caller: &CurrentUser,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ApiError> {
        let detail = self.fetch_detail(booking_id).await?;
        authorize(caller, Action::ViewBooking { owner: detail.user.id })?;
        Ok(detail)
    }

    /// List bookings. Admins see everything; regular users only their own.
    pub async fn list(
        &self,
        caller: &CurrentUser,
        query: &BookingListQuery,
    ) -> Result<Paginated<BookingResponse>, ApiError> {
        let owner_filter = owner_scope(caller);
        let page = query.page.unwrap_or(1).max(1);
        let offset = (page - 1) as i64 * PAGE_SIZE as i64;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings b
             WHERE ($1::uuid IS NULL OR b.user_id = $1)
               AND ($2::text IS NULL OR b.status = $2)
               AND ($3::text IS NULL OR b.payment_status = $3)",
        )
        .bind(owner_filter)
        .bind(&query.status)
        .bind(&query.payment_status)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, BookingDetailRow>(&format!(
            "{DETAIL_SELECT}
             WHERE ($1::uuid IS NULL OR b.user_id = $1)
               AND ($2::text IS NULL OR b.status = $2)
               AND ($3::text IS NULL OR b.payment_status = $3)
             ORDER BY b.created_at DESC
             LIMIT $4 OFFSET $5"
        ))
        .bind(owner_filter)
        .bind(&query.status)
        .bind(&query.payment_status)
        .bind(PAGE_SIZE as i64)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated {
            data: rows.into_iter().map(BookingResponse::from).collect(),
            page,
            per_page: PAGE_SIZE,
            total,
        })
    }

    /// Approve or reject a pending booking. Any other requested status is a
    /// validation failure, and only a booking still in `pending` can move.
    pub async fn update_status(
        &self,
        caller: &CurrentUser,
        booking_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<BookingResponse, ApiError> {
        authorize(caller, Action::ManageBookings)?;

        if !matches!(
            request.status,
            BookingStatus::Approved | BookingStatus::Rejected
        ) {
            return Err(ApiError::bad_request(
                "The status must be either approved or rejected.",
            ));
        }

        let booking = self.fetch_booking(booking_id).await?;
        if !booking.status().can_transition_to(request.status) {
            return Err(transition_refused(&booking.status, request.status.as_str()));
        }

        let result = sqlx::query(
            "UPDATE bookings
             SET status = $2, admin_notes = COALESCE($3, admin_notes), updated_at = now()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(booking_id)
        .bind(request.status.as_str())
        .bind(&request.admin_notes)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race; report against the state that won.
            let booking = self.fetch_booking(booking_id).await?;
            return Err(transition_refused(&booking.status, request.status.as_str()));
        }

        self.fetch_detail(booking_id).await
    }

    /// Cancel a pending booking. Owners cancel their own; admins may cancel
    /// any pending booking.
    pub async fn cancel(
        &self,
        caller: &CurrentUser,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ApiError> {
        let booking = self.fetch_booking(booking_id).await?;
        authorize(caller, Action::CancelBooking { owner: booking.user_id })?;

        if !booking.status().can_transition_to(BookingStatus::Cancelled) {
            return Err(ApiError::policy("Only pending bookings can be cancelled"));
        }

        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = now()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(booking_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::policy("Only pending bookings can be cancelled"));
        }

        self.fetch_detail(booking_id).await
    }

    /// Mark an approved booking as completed.
    pub async fn complete(
        &self,
        caller: &CurrentUser,
        booking_id: Uuid,
        request: CompleteBookingRequest,
    ) -> Result<BookingResponse, ApiError> {
        authorize(caller, Action::ManageBookings)?;

        let booking = self.fetch_booking(booking_id).await?;
        if !booking.status().can_transition_to(BookingStatus::Completed) {
            return Err(ApiError::policy(
                "Only approved bookings can be marked as completed",
            ));
        }

        let result = sqlx::query(
            "UPDATE bookings
             SET status = 'completed',
                 admin_notes = COALESCE($2, 'Service completed successfully'),
                 updated_at = now()
             WHERE id = $1 AND status = 'approved'",
        )
        .bind(booking_id)
        .bind(&request.admin_notes)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::policy(
                "Only approved bookings can be marked as completed",
            ));
        }

        self.fetch_detail(booking_id).await
    }

    /// Record the cash settlement. A second call is a no-op with a message,
    /// never an error, and never flips the payment back.
    pub async fn mark_payment_received(
        &self,
        caller: &CurrentUser,
        booking_id: Uuid,
        request: MarkPaymentRequest,
    ) -> Result<MarkPaymentOutcome, ApiError> {
        authorize(caller, Action::ManageBookings)?;

        let booking = self.fetch_booking(booking_id).await?;
        if booking.is_paid() {
            return Ok(MarkPaymentOutcome::AlreadyPaid);
        }

        let default_note = settlement_note(request.received_amount);
        let result = sqlx::query(
            "UPDATE bookings
             SET payment_status = 'paid', admin_notes = COALESCE($2, $3), updated_at = now()
             WHERE id = $1 AND payment_status = 'pending'",
        )
        .bind(booking_id)
        .bind(&request.admin_notes)
        .bind(&default_note)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(MarkPaymentOutcome::AlreadyPaid);
        }

        Ok(MarkPaymentOutcome::Marked(self.fetch_detail(booking_id).await?))
    }

    /// Bookings still owed money: payment pending on an approved or
    /// completed booking, oldest service date first.
    pub async fn pending_payments(
        &self,
        caller: &CurrentUser,
        page: Option<u32>,
    ) -> Result<Paginated<BookingResponse>, ApiError> {
        authorize(caller, Action::ViewPayments)?;

        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1) as i64 * PAGE_SIZE as i64;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE payment_status = 'pending' AND status IN ('approved', 'completed')",
        )
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, BookingDetailRow>(&format!(
            "{DETAIL_SELECT}
             WHERE b.payment_status = 'pending' AND b.status IN ('approved', 'completed')
             ORDER BY b.booking_date ASC
             LIMIT $1 OFFSET $2"
        ))
        .bind(PAGE_SIZE as i64)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated {
            data: rows.into_iter().map(BookingResponse::from).collect(),
            page,
            per_page: PAGE_SIZE,
            total,
        })
    }

    /// Aggregate payment figures over an optional booking-date range.
    pub async fn payment_summary(
        &self,
        caller: &CurrentUser,
        query: &PaymentSummaryQuery,
    ) -> Result<PaymentSummary, ApiError> {
        authorize(caller, Action::ViewPayments)?;

        if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
            if to < from {
                return Err(ApiError::bad_request(
                    "The date_to must be a date after or equal to date_from.",
                ));
            }
        }

        let summary = sqlx::query_as::<_, PaymentSummary>(
            "SELECT COUNT(*) AS total_bookings,
                    COUNT(*) FILTER (WHERE payment_status = 'pending') AS pending_payments,
                    COUNT(*) FILTER (WHERE payment_status = 'paid') AS completed_payments,
                    COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'pending'), 0)
                        AS total_pending_amount,
                    COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'paid'), 0)
                        AS total_received_amount,
                    COUNT(*) FILTER (WHERE status = 'approved') AS approved_bookings,
                    COUNT(*) FILTER (WHERE status = 'rejected') AS rejected_bookings
             FROM bookings
             WHERE ($1::date IS NULL OR booking_date >= $1)
               AND ($2::date IS NULL OR booking_date <= $2)",
        )
        .bind(query.date_from)
        .bind(query.date_to)
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }

    async fn fetch_booking(&self, booking_id: Uuid) -> Result<Booking, ApiError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ApiError::NotFound("Booking"))
    }

    async fn fetch_detail(&self, booking_id: Uuid) -> Result<BookingResponse, ApiError> {
        let row = sqlx::query_as::<_, BookingDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE b.id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Booking"))?;

        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use sqlx::error::ErrorKind;

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

    #[derive(Debug)]
    struct StubDbError {
        unique: bool,
    }

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "stub database error")
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "stub database error"
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn admins_list_everything_users_only_their_own() {
        let admin = caller(UserRole::Admin);
        assert_eq!(owner_scope(&admin), None);

        let user = caller(UserRole::User);
        assert_eq!(owner_scope(&user), Some(user.id));
    }

    #[test]
    fn lost_insert_race_reads_as_duplicate_slot() {
        let error = sqlx::Error::Database(Box::new(StubDbError { unique: true }));
        assert_matches!(
            duplicate_slot_error(error),
            ApiError::Policy(message) if message == DUPLICATE_SLOT_MESSAGE
        );
    }

    #[test]
    fn other_insert_failures_stay_database_errors() {
        let error = sqlx::Error::Database(Box::new(StubDbError { unique: false }));
        assert_matches!(duplicate_slot_error(error), ApiError::Database(_));

        assert_matches!(
            duplicate_slot_error(sqlx::Error::RowNotFound),
            ApiError::Database(_)
        );
    }

    #[test]
    fn settlement_note_carries_the_amount() {
        assert_eq!(settlement_note(75.0), "Cash payment received - Amount: $75");
        assert_eq!(
            settlement_note(89.99),
            "Cash payment received - Amount: $89.99"
        );
    }

    #[test]
    fn transition_refusals_name_both_states() {
        assert_matches!(
            transition_refused("completed", "approved"),
            ApiError::Policy(message)
                if message == "Only pending bookings can be approved; this booking is completed."
        );
    }
}
