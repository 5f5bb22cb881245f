// handlers/auth/login.rs - POST /v1/auth/login handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::UserPublic;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserPublic,
}

/// POST /v1/auth/login - Exchange credentials for a bearer token
///
/// Input: `{ "username": "string", "password": "string" }`
pub async fn login_post(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let user = state
        .users
        .authenticate(&payload.username, &payload.password)
        .await?;
    let access_token = state.jwt.generate(user.id, &user.username)?;

    Ok(ApiResponse::success(LoginResponse {
        access_token,
        token_type: "bearer",
        expires_in: state.jwt.expires_in(),
        user: user.into(),
    }))
}
