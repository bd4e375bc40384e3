use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::types::auth::{AccessToken, AuthUser};
use nutrifit_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::services::user_service::{self, UserDetail};
use crate::services::{auth_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: AccessToken,
    pub user: User,
}

// --- POST /authentication/login ---

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;

    let user: User = users::table
        .filter(users::email.eq(auth_service::normalize_email(&req.email)))
        .filter(users::status.eq(true))
        .select(User::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    if !auth_service::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"));
    }

    let token = token_service::create_access_token(&user, &state.jwt, state.config.jwt_access_ttl)?;

    tracing::info!(user_id = %user.id, profile = %user.profile, "user logged in");

    Ok(Json(ApiResponse::ok(LoginResponse { token, user })))
}

// --- GET /authentication/validateSession ---

pub async fn validate_session(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let mut conn = db::conn(&state.db)?;

    let current = user_service::find_active_user(&mut conn, user.id)
        .map_err(|_| AppError::new(ErrorCode::TokenInvalid, "session user no longer exists"))?;

    Ok(Json(ApiResponse::ok(user_service::load_detail(&mut conn, current)?)))
}
