//! HTTP handlers for authentication

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, LoginInput, LoginResponse, Role};
use crate::AppState;

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.login(input).await?;
    Ok(Json(response))
}

/// The signed-in user's identity and role
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: String,
    pub role: Role,
}

/// Resolve the current session to its identity and role
pub async fn me(current_user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        email: current_user.0.email,
        role: current_user.0.role,
    })
}
