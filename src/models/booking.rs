use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Booking lifecycle states.
///
/// `pending -> {approved, rejected, cancelled}`, `approved -> completed`.
/// `rejected`, `cancelled` and `completed` are terminal; nothing ever moves
/// back to `pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (
                BookingStatus::Pending,
                BookingStatus::Approved | BookingStatus::Rejected | BookingStatus::Cancelled
            ) | (BookingStatus::Approved, BookingStatus::Completed)
        )
    }
}

/// Cash settlement state, orthogonal to the booking status. Moves from
/// `pending` to `paid` exactly once and never back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub status: String,
    pub payment_status: String,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        BookingStatus::from_str(&self.status).unwrap_or(BookingStatus::Pending)
    }

    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_str(&self.payment_status).unwrap_or(PaymentStatus::Pending)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status() == PaymentStatus::Paid
    }
}

/// Booking joined with its service and owner, as returned by the API.
#[derive(Debug, Clone, FromRow)]
pub struct BookingDetailRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub status: String,
    pub payment_status: String,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub service_name: String,
    pub service_category: String,
    pub service_price: f64,
    pub service_duration_minutes: i32,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingUserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub status: String,
    pub payment_status: String,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub service: BookingServiceSummary,
    pub user: BookingUserSummary,
}

impl From<BookingDetailRow> for BookingResponse {
    fn from(row: BookingDetailRow) -> Self {
        Self {
            id: row.id,
            booking_date: row.booking_date,
            booking_time: row.booking_time,
            status: row.status,
            payment_status: row.payment_status,
            total_amount: row.total_amount,
            notes: row.notes,
            admin_notes: row.admin_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            service: BookingServiceSummary {
                id: row.service_id,
                name: row.service_name,
                category: row.service_category,
                price: row.service_price,
                duration_minutes: row.service_duration_minutes,
            },
            user: BookingUserSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
        }
    }
}

fn validate_time_format(value: &str) -> Result<(), ValidationError> {
    parse_booking_time(value).map(|_| ()).ok_or_else(|| {
        let mut error = ValidationError::new("booking_time");
        error.message = Some("The booking time must match the format H:i.".into());
        error
    })
}

/// Accepts `HH:MM` (the documented format) as well as `HH:MM:SS`.
pub fn parse_booking_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    #[validate(custom(function = "validate_time_format"))]
    pub booking_time: String,
    #[validate(length(max = 500, message = "The notes may not be greater than 500 characters."))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    #[validate(length(max = 500, message = "The admin notes may not be greater than 500 characters."))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteBookingRequest {
    #[validate(length(max = 500, message = "The admin notes may not be greater than 500 characters."))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkPaymentRequest {
    #[validate(range(min = 0.0, message = "The received amount must be at least 0."))]
    pub received_amount: f64,
    #[validate(length(max = 500, message = "The admin notes may not be greater than 500 characters."))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentSummaryQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PaymentSummary {
    pub total_bookings: i64,
    pub pending_payments: i64,
    pub completed_payments: i64,
    pub total_pending_amount: f64,
    pub total_received_amount: f64,
    pub approved_bookings: i64,
    pub rejected_bookings: i64,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}
