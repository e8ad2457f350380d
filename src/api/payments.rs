use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};

use crate::api::{ApiData, AppState};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{
    BookingResponse, PageQuery, Paginated, PaymentSummary, PaymentSummaryQuery,
};

/// Bookings still awaiting cash settlement (admin only).
#[tracing::instrument(skip(state, caller))]
pub async fn pending_payments(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiData<Paginated<BookingResponse>>>, ApiError> {
    let bookings = state.bookings.pending_payments(&caller, query.page).await?;
    Ok(Json(ApiData::new(
        "Pending payments retrieved successfully",
        bookings,
    )))
}

/// Aggregate payment figures, optionally restricted to a date range
/// (admin only).
#[tracing::instrument(skip(state, caller))]
pub async fn payment_summary(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Query(query): Query<PaymentSummaryQuery>,
) -> Result<Json<ApiData<PaymentSummary>>, ApiError> {
    let summary = state.bookings.payment_summary(&caller, &query).await?;
    Ok(Json(ApiData::new(
        "Payment summary retrieved successfully",
        summary,
    )))
}
