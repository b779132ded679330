use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{AccountDto, ApiError, ApiResponse, AppState, UsersDto};

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<UsersDto>>, ApiError> {
    let accounts = state.credentials().list_accounts().await?;
    if accounts.is_empty() {
        return Err(ApiError::NotFound("No users found".to_string()));
    }

    Ok(Json(ApiResponse::success(UsersDto {
        users: accounts.into_iter().map(AccountDto::from).collect(),
    })))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id, "user")?;
    state.credentials().delete_account(id).await?;
    tracing::info!(account_id = id, "Account deleted");
    Ok(Json(ApiResponse::ack("User deleted successfully")))
}
