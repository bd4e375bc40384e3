use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::middleware::CustomerUser;
use nutrifit_shared::types::{ApiResponse, Removed};

use crate::models::{FavoriteProfessional, NewFavoriteProfessional, User};
use crate::schema::{favorite_professionals, users};
use crate::services::user_service;
use crate::AppState;

// --- GET /user/favorites ---

pub async fn list_favorites(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let mut conn = db::conn(&state.db)?;

    let professionals = favorite_professionals::table
        .inner_join(users::table.on(users::id.eq(favorite_professionals::professional_id)))
        .filter(favorite_professionals::customer_id.eq(user.id))
        .filter(users::status.eq(true))
        .order(favorite_professionals::created_at.desc())
        .select(User::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(professionals)))
}

// --- POST /user/favorites/:professional_id ---

pub async fn add_favorite(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Path(professional_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FavoriteProfessional>>> {
    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    user_service::find_active_professional(&mut conn, professional_id)?;

    let favorite = diesel::insert_into(favorite_professionals::table)
        .values(&NewFavoriteProfessional { customer_id: user.id, professional_id })
        .on_conflict_do_nothing()
        .returning(FavoriteProfessional::as_returning())
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::FavoriteAlreadyExists, "professional is already a favorite"))?;

    tracing::info!(customer_id = %user.id, professional_id = %professional_id, "favorite added");

    Ok(Json(ApiResponse::ok(favorite)))
}

// --- DELETE /user/favorites/:professional_id ---

pub async fn remove_favorite(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Path(professional_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let mut conn = db::conn(&state.db)?;

    let removed: Uuid = diesel::delete(
        favorite_professionals::table
            .filter(favorite_professionals::customer_id.eq(user.id))
            .filter(favorite_professionals::professional_id.eq(professional_id)),
    )
    .returning(favorite_professionals::id)
    .get_result(&mut conn)
    .optional()?
    .ok_or_else(|| AppError::new(ErrorCode::FavoriteNotFound, "professional is not a favorite"))?;

    tracing::info!(customer_id = %user.id, professional_id = %professional_id, "favorite removed");

    Ok(Json(ApiResponse::ok(Removed::new(removed))))
}
