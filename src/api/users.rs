use axum::{extract::State, response::Json, Extension};

use crate::api::{ApiData, AppState};
use crate::auth::{authorize, Action, CurrentUser};
use crate::error::ApiError;
use crate::models::UserResponse;

/// List all registered users (admin only).
#[tracing::instrument(skip(state, caller))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<ApiData<Vec<UserResponse>>>, ApiError> {
    authorize(&caller, Action::ViewAllUsers)?;

    let users = state.users.list_users().await?;
    Ok(Json(ApiData::new("Users retrieved successfully", users)))
}
