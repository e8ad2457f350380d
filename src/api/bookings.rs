use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::api::{ApiData, AppState};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{
    BookingListQuery, BookingResponse, CompleteBookingRequest, CreateBookingRequest,
    MarkPaymentRequest, Paginated, UpdateStatusRequest,
};
use crate::services::MarkPaymentOutcome;

/// List bookings for the caller (all of them for admins), newest first.
#[tracing::instrument(skip(state, caller))]
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiData<Paginated<BookingResponse>>>, ApiError> {
    let bookings = state.bookings.list(&caller, &query).await?;
    Ok(Json(ApiData::new(
        "Bookings retrieved successfully",
        bookings,
    )))
}

/// Create a booking; payment is collected in cash out-of-band.
#[tracing::instrument(skip(state, caller, request))]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;
    let (booking, payment_info) = state.bookings.create(&caller, request).await?;

    Ok(Json(json!({
        "message": "Booking created successfully. Payment will be collected in cash.",
        "data": booking,
        "payment_info": payment_info,
    })))
}

#[tracing::instrument(skip(state, caller))]
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiData<BookingResponse>>, ApiError> {
    let booking = state.bookings.get(&caller, booking_id).await?;
    Ok(Json(ApiData::new("Booking retrieved successfully", booking)))
}

/// Approve or reject a pending booking (admin only).
#[tracing::instrument(skip(state, caller, request))]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiData<BookingResponse>>, ApiError> {
    request.validate()?;
    let booking = state
        .bookings
        .update_status(&caller, booking_id, request)
        .await?;

    Ok(Json(ApiData::new(
        "Booking status updated successfully",
        booking,
    )))
}

/// Cancel a pending booking (owner, or admin).
#[tracing::instrument(skip(state, caller))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiData<BookingResponse>>, ApiError> {
    let booking = state.bookings.cancel(&caller, booking_id).await?;
    Ok(Json(ApiData::new("Booking cancelled successfully", booking)))
}

/// Mark an approved booking as completed (admin only).
#[tracing::instrument(skip(state, caller, request))]
pub async fn complete_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CompleteBookingRequest>,
) -> Result<Json<ApiData<BookingResponse>>, ApiError> {
    request.validate()?;
    let booking = state
        .bookings
        .complete(&caller, booking_id, request)
        .await?;

    Ok(Json(ApiData::new("Booking marked as completed", booking)))
}

/// Record the cash payment for a booking (admin only). Marking an already
/// paid booking is a no-op with a message.
#[tracing::instrument(skip(state, caller, request))]
pub async fn mark_payment_received(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<MarkPaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    match state
        .bookings
        .mark_payment_received(&caller, booking_id, request)
        .await?
    {
        MarkPaymentOutcome::Marked(booking) => Ok(Json(json!({
            "message": "Cash payment marked as received",
            "data": booking,
        }))),
        MarkPaymentOutcome::AlreadyPaid => Ok(Json(json!({
            "message": "Payment already marked as received",
        }))),
    }
}
