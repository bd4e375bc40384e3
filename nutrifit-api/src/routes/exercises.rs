use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::AppResult;
use nutrifit_shared::types::auth::AuthUser;
use nutrifit_shared::types::pagination::{default_page, default_per_page, Paginated, PaginationParams};
use nutrifit_shared::types::{ApiResponse, Removed};

use crate::models::{Exercise, NewExercise, UpdateExercise};
use crate::schema::exercises;
use crate::services::exercise_service::{self, CatalogFilter};
use crate::services::user_service;
use crate::AppState;

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct ExerciseFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub category: Option<String>,
    pub muscle: Option<String>,
    pub search: Option<String>,
}

impl ExerciseFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            category: self.category.clone(),
            muscle: self.muscle.clone(),
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub instructions: Option<String>,
    #[validate(length(min = 1, max = 60, message = "category must be 1-60 characters"))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub secondary_muscles: Vec<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExerciseRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 4000))]
    pub instructions: Option<String>,
    #[validate(length(min = 1, max = 60, message = "category must be 1-60 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 20))]
    pub primary_muscles: Option<Vec<String>>,
    #[validate(length(max = 20))]
    pub secondary_muscles: Option<Vec<String>>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

// --- GET /exercise ---

pub async fn list_exercises(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExerciseFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Exercise>>>> {
    let pagination = params.pagination();
    let filter = params.filter();

    let mut conn = db::conn(&state.db)?;

    let total: i64 = exercise_service::catalog_query(user.id, &filter)
        .count()
        .get_result(&mut conn)?;

    let items = exercise_service::catalog_query(user.id, &filter)
        .order(exercises::name.asc())
        .offset(pagination.offset())
        .limit(pagination.limit() as i64)
        .select(Exercise::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &pagination))))
}

// --- POST /exercise ---

/// Custom exercises start unpublished and are visible only to their creator.
pub async fn create_exercise(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateExerciseRequest>,
) -> AppResult<Json<ApiResponse<Exercise>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;

    let exercise = diesel::insert_into(exercises::table)
        .values(&NewExercise {
            name: req.name.trim().to_string(),
            instructions: req.instructions,
            category: req.category.trim().to_lowercase(),
            primary_muscles: exercise_service::normalize_muscles(&req.primary_muscles),
            secondary_muscles: exercise_service::normalize_muscles(&req.secondary_muscles),
            image_url: req.image_url,
            video_url: req.video_url,
            created_by_user_id: Some(user.id),
            is_published: false,
        })
        .returning(Exercise::as_returning())
        .get_result(&mut conn)?;

    tracing::info!(exercise_id = %exercise.id, created_by = %user.id, "custom exercise created");

    Ok(Json(ApiResponse::ok(exercise)))
}

// --- GET /exercise/:id ---

pub async fn get_exercise(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Exercise>>> {
    let mut conn = db::conn(&state.db)?;
    let exercise = exercise_service::find_visible_exercise(&mut conn, id, user.id)?;
    Ok(Json(ApiResponse::ok(exercise)))
}

// --- PUT /exercise/:id ---

pub async fn update_exercise(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateExerciseRequest>,
) -> AppResult<Json<ApiResponse<Exercise>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    let exercise = exercise_service::find_own_exercise(&mut conn, id, user.id)?;

    let changes = UpdateExercise {
        name: req.name.map(|n| n.trim().to_string()),
        instructions: req.instructions,
        category: req.category.map(|c| c.trim().to_lowercase()),
        primary_muscles: req.primary_muscles.as_deref().map(exercise_service::normalize_muscles),
        secondary_muscles: req.secondary_muscles.as_deref().map(exercise_service::normalize_muscles),
        image_url: req.image_url,
        video_url: req.video_url,
    };
    if changes.is_empty() {
        return Ok(Json(ApiResponse::ok(exercise)));
    }

    let updated = diesel::update(exercises::table.find(id))
        .set(&changes)
        .returning(Exercise::as_returning())
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- DELETE /exercise/:id ---

pub async fn delete_exercise(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let mut conn = db::conn(&state.db)?;
    exercise_service::find_own_exercise(&mut conn, id, user.id)?;

    // Templates and past sessions keep pointing at the row.
    diesel::update(exercises::table.find(id))
        .set(exercises::status.eq(false))
        .execute(&mut conn)?;

    tracing::info!(exercise_id = %id, "custom exercise deleted");

    Ok(Json(ApiResponse::ok(Removed::new(id))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_params_default_to_first_page() {
        let params: ExerciseFilterParams =
            serde_json::from_value(serde_json::json!({ "muscle": "Chest" })).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, default_per_page());
        assert_eq!(params.filter().muscle.as_deref(), Some("Chest"));
    }

    #[test]
    fn create_request_rejects_bad_urls() {
        let req: CreateExerciseRequest = serde_json::from_value(serde_json::json!({
            "name": "Cable fly",
            "category": "strength",
            "image_url": "not a url",
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
