use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult};
use nutrifit_shared::middleware::ProfessionalUser;
use nutrifit_shared::types::auth::AuthUser;
use nutrifit_shared::types::{ApiResponse, Removed};

use crate::models::{
    ExerciseTemplate, NewExerciseTemplate, NewWorkoutTemplate, UpdateExerciseTemplate, UpdateWorkoutTemplate,
    WorkoutTemplate,
};
use crate::schema::{exercise_templates, workout_templates};
use crate::services::template_service::{self, WorkoutTemplateDetail};
use crate::services::{exercise_service, routine_service, user_service};
use crate::AppState;

// --- Request types ---

#[derive(Debug, Deserialize, Validate)]
pub struct ExerciseTemplateRequest {
    pub exercise_id: Uuid,
    #[validate(range(min = 1, max = 20, message = "target_sets must be between 1 and 20"))]
    pub target_sets: i32,
    #[validate(range(min = 1, max = 100, message = "target_reps must be between 1 and 100"))]
    pub target_reps: i32,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub target_load: Option<f64>,
    #[validate(range(min = 0, max = 900))]
    pub rest_seconds: Option<i32>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    pub routine_id: Uuid,
    #[validate(length(min = 1, max = 120, message = "title must be 1-120 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub position: Option<i32>,
    #[serde(default)]
    #[validate]
    pub exercises: Vec<ExerciseTemplateRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 1, max = 120, message = "title must be 1-120 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExerciseTemplateRequest {
    pub exercise_id: Option<Uuid>,
    #[validate(range(min = 1, max = 20, message = "target_sets must be between 1 and 20"))]
    pub target_sets: Option<i32>,
    #[validate(range(min = 1, max = 100, message = "target_reps must be between 1 and 100"))]
    pub target_reps: Option<i32>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub target_load: Option<f64>,
    #[validate(range(min = 0, max = 900))]
    pub rest_seconds: Option<i32>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRequest {
    #[validate(length(min = 1, message = "exercise_template_ids must not be empty"))]
    pub exercise_template_ids: Vec<Uuid>,
}

impl ExerciseTemplateRequest {
    fn into_new(self, workout_template_id: Uuid, position: i32) -> NewExerciseTemplate {
        NewExerciseTemplate {
            workout_template_id,
            exercise_id: self.exercise_id,
            position,
            target_sets: self.target_sets,
            target_reps: self.target_reps,
            target_load: self.target_load,
            rest_seconds: self.rest_seconds,
            notes: self.notes,
        }
    }
}

// --- POST /workoutTemplate ---

pub async fn create_template(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTemplateRequest>,
) -> AppResult<Json<ApiResponse<WorkoutTemplateDetail>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    let routine = routine_service::find_owned_routine(&mut conn, req.routine_id, user.id)?;
    let exercise_ids: Vec<Uuid> = req.exercises.iter().map(|e| e.exercise_id).collect();
    exercise_service::ensure_usable(&mut conn, &exercise_ids, user.id)?;

    let detail = conn.transaction::<_, AppError, _>(|conn| {
        let position = match req.position {
            Some(p) => p,
            None => {
                let count: i64 = workout_templates::table
                    .filter(workout_templates::routine_id.eq(routine.id))
                    .filter(workout_templates::status.eq(true))
                    .count()
                    .get_result(conn)?;
                i32::try_from(count).unwrap_or(i32::MAX)
            }
        };

        let template: WorkoutTemplate = diesel::insert_into(workout_templates::table)
            .values(&NewWorkoutTemplate {
                routine_id: routine.id,
                title: req.title.trim().to_string(),
                description: req.description,
                position,
            })
            .returning(WorkoutTemplate::as_returning())
            .get_result(conn)?;

        let new_exercises: Vec<NewExerciseTemplate> = req
            .exercises
            .into_iter()
            .zip(0..)
            .map(|(e, position)| e.into_new(template.id, position))
            .collect();

        let exercises = if new_exercises.is_empty() {
            Vec::new()
        } else {
            let mut rows: Vec<ExerciseTemplate> = diesel::insert_into(exercise_templates::table)
                .values(&new_exercises)
                .returning(ExerciseTemplate::as_returning())
                .get_results(conn)?;
            rows.sort_by_key(|e| e.position);
            rows
        };

        Ok(WorkoutTemplateDetail { template, exercises })
    })?;

    tracing::info!(
        workout_template_id = %detail.template.id,
        routine_id = %routine.id,
        exercises = detail.exercises.len(),
        "workout template created"
    );

    Ok(Json(ApiResponse::ok(detail)))
}

// --- GET /workoutTemplate/routine/:routine_id ---

pub async fn list_by_routine(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(routine_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<WorkoutTemplateDetail>>>> {
    let mut conn = db::conn(&state.db)?;
    routine_service::find_visible_routine(&mut conn, routine_id, user.id)?;

    let templates = workout_templates::table
        .filter(workout_templates::routine_id.eq(routine_id))
        .filter(workout_templates::status.eq(true))
        .order((workout_templates::position.asc(), workout_templates::created_at.asc()))
        .select(WorkoutTemplate::as_select())
        .load(&mut conn)?;

    let details = templates
        .into_iter()
        .map(|t| template_service::load_detail(&mut conn, t))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(ApiResponse::ok(details)))
}

// --- GET /workoutTemplate/:id ---

pub async fn get_template(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WorkoutTemplateDetail>>> {
    let mut conn = db::conn(&state.db)?;
    let template = template_service::find_template(&mut conn, id)?;
    routine_service::find_visible_routine(&mut conn, template.routine_id, user.id)?;

    Ok(Json(ApiResponse::ok(template_service::load_detail(&mut conn, template)?)))
}

// --- PUT /workoutTemplate/:id ---

pub async fn update_template(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateRequest>,
) -> AppResult<Json<ApiResponse<WorkoutTemplateDetail>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    let (template, _) = template_service::find_owned_template(&mut conn, id, user.id)?;

    let changes = UpdateWorkoutTemplate {
        title: req.title.map(|t| t.trim().to_string()),
        description: req.description,
        position: req.position,
    };
    let template = if changes.is_empty() {
        template
    } else {
        diesel::update(workout_templates::table.find(id))
            .set(&changes)
            .returning(WorkoutTemplate::as_returning())
            .get_result(&mut conn)?
    };

    Ok(Json(ApiResponse::ok(template_service::load_detail(&mut conn, template)?)))
}

// --- DELETE /workoutTemplate/:id ---

pub async fn delete_template(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let mut conn = db::conn(&state.db)?;
    template_service::find_owned_template(&mut conn, id, user.id)?;

    diesel::update(workout_templates::table.find(id))
        .set(workout_templates::status.eq(false))
        .execute(&mut conn)?;

    tracing::info!(workout_template_id = %id, "workout template deleted");

    Ok(Json(ApiResponse::ok(Removed::new(id))))
}

// --- PUT /workoutTemplate/:id/reorder ---

pub async fn reorder_exercises(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> AppResult<Json<ApiResponse<Vec<ExerciseTemplate>>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    template_service::find_owned_template(&mut conn, id, user.id)?;

    let ordered = template_service::reorder(&mut conn, id, &req.exercise_template_ids)?;

    tracing::info!(workout_template_id = %id, exercises = ordered.len(), "exercise templates reordered");

    Ok(Json(ApiResponse::ok(ordered)))
}

// --- POST /workoutTemplate/:id/exercises ---

pub async fn add_exercise_template(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ExerciseTemplateRequest>,
) -> AppResult<Json<ApiResponse<ExerciseTemplate>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    template_service::find_owned_template(&mut conn, id, user.id)?;
    exercise_service::find_visible_exercise(&mut conn, req.exercise_id, user.id)?;

    let position = template_service::next_position(&mut conn, id)?;
    let created = diesel::insert_into(exercise_templates::table)
        .values(&req.into_new(id, position))
        .returning(ExerciseTemplate::as_returning())
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(created)))
}

// --- PUT /workoutTemplate/exercises/:id ---

pub async fn update_exercise_template(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateExerciseTemplateRequest>,
) -> AppResult<Json<ApiResponse<ExerciseTemplate>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    let current = template_service::find_exercise_template(&mut conn, id)?;
    template_service::find_owned_template(&mut conn, current.workout_template_id, user.id)?;
    if let Some(exercise_id) = req.exercise_id {
        exercise_service::find_visible_exercise(&mut conn, exercise_id, user.id)?;
    }

    let changes = UpdateExerciseTemplate {
        exercise_id: req.exercise_id,
        target_sets: req.target_sets,
        target_reps: req.target_reps,
        target_load: req.target_load,
        rest_seconds: req.rest_seconds,
        notes: req.notes,
    };
    if changes.is_empty() {
        return Ok(Json(ApiResponse::ok(current)));
    }

    let updated = diesel::update(exercise_templates::table.find(id))
        .set(&changes)
        .returning(ExerciseTemplate::as_returning())
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- DELETE /workoutTemplate/exercises/:id ---

pub async fn remove_exercise_template(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let mut conn = db::conn(&state.db)?;
    let current = template_service::find_exercise_template(&mut conn, id)?;
    template_service::find_owned_template(&mut conn, current.workout_template_id, user.id)?;

    // Past exercise sessions keep their data; their template link is nulled by the FK.
    diesel::delete(exercise_templates::table.find(id)).execute(&mut conn)?;

    tracing::info!(exercise_template_id = %id, workout_template_id = %current.workout_template_id, "exercise template removed");

    Ok(Json(ApiResponse::ok(Removed::new(id))))
}
