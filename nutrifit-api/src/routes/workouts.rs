use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::middleware::CustomerUser;
use nutrifit_shared::types::pagination::{Paginated, PaginationParams};
use nutrifit_shared::types::ApiResponse;

use crate::models::{ExerciseSession, SetSession, WorkoutSession};
use crate::schema::{exercise_sessions, set_sessions, workout_sessions, workout_templates};
use crate::services::workout_service::{self, WorkoutSessionDetail};
use crate::services::{routine_service, template_service, user_service};
use crate::status::{ExerciseSessionStatus, WorkoutSessionStatus};
use crate::AppState;

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct StartWorkoutRequest {
    pub workout_template_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FinishWorkoutRequest {
    pub status: WorkoutSessionStatus,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseSessionRequest {
    pub status: ExerciseSessionStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetResult {
    pub set_id: Uuid,
    #[validate(range(min = 0.0, max = 1000.0, message = "load must be between 0 and 1000"))]
    pub load: Option<f64>,
    #[validate(range(min = 0, max = 1000, message = "reps must be between 0 and 1000"))]
    pub reps: Option<i32>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordSetsRequest {
    #[validate]
    pub sets: Vec<SetResult>,
}

impl RecordSetsRequest {
    fn check(&self) -> AppResult<()> {
        if self.sets.is_empty() {
            return Err(AppError::bad_request("sets must not be empty"));
        }
        self.validate()?;
        Ok(())
    }
}

// --- POST /workout ---

/// Starts a session from a template of a routine assigned to the caller.
pub async fn start_workout(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartWorkoutRequest>,
) -> AppResult<Json<ApiResponse<WorkoutSessionDetail>>> {
    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;

    let template = template_service::find_template(&mut conn, req.workout_template_id)?;
    routine_service::find_routine(&mut conn, template.routine_id)?;
    if !routine_service::is_assigned(&mut conn, template.routine_id, user.id)? {
        return Err(AppError::new(
            ErrorCode::NotRoutineOwner,
            "this workout belongs to a routine that is not assigned to you",
        ));
    }

    let detail = workout_service::start_session(&mut conn, &template, user.id)?;

    Ok(Json(ApiResponse::ok(detail)))
}

// --- GET /workout ---

pub async fn list_my_workouts(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<WorkoutSession>>>> {
    let mut conn = db::conn(&state.db)?;

    let total: i64 = workout_sessions::table
        .filter(workout_sessions::customer_id.eq(user.id))
        .count()
        .get_result(&mut conn)?;

    let items = workout_sessions::table
        .filter(workout_sessions::customer_id.eq(user.id))
        .order(workout_sessions::started_at.desc())
        .offset(params.offset())
        .limit(params.limit() as i64)
        .select(WorkoutSession::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

// --- GET /workout/routine/:routine_id ---

pub async fn list_by_routine(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Path(routine_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<WorkoutSession>>>> {
    let mut conn = db::conn(&state.db)?;

    let items = workout_sessions::table
        .inner_join(workout_templates::table)
        .filter(workout_templates::routine_id.eq(routine_id))
        .filter(workout_sessions::customer_id.eq(user.id))
        .order(workout_sessions::started_at.desc())
        .select(WorkoutSession::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

// --- GET /workout/:id ---

pub async fn get_workout(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WorkoutSessionDetail>>> {
    let mut conn = db::conn(&state.db)?;
    let session = workout_service::find_own_session(&mut conn, id, user.id)?;
    Ok(Json(ApiResponse::ok(workout_service::load_detail(&mut conn, session)?)))
}

// --- PUT /workout/:id ---

/// Completes or cancels a session.
pub async fn finish_workout(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FinishWorkoutRequest>,
) -> AppResult<Json<ApiResponse<WorkoutSessionDetail>>> {
    let mut conn = db::conn(&state.db)?;
    let session = workout_service::find_own_session(&mut conn, id, user.id)?;

    let finished = workout_service::finish_session(&mut conn, session, req.status)?;

    Ok(Json(ApiResponse::ok(workout_service::load_detail(&mut conn, finished)?)))
}

// --- PUT /workout/:id/sets ---

pub async fn record_sets(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordSetsRequest>,
) -> AppResult<Json<ApiResponse<WorkoutSessionDetail>>> {
    req.check()?;

    let mut conn = db::conn(&state.db)?;
    let session = workout_service::find_own_session(&mut conn, id, user.id)?;
    workout_service::require_in_progress(&session)?;

    conn.transaction::<_, AppError, _>(|conn| {
        let now = Utc::now();
        for result in &req.sets {
            let current: SetSession = set_sessions::table
                .inner_join(exercise_sessions::table)
                .filter(set_sessions::id.eq(result.set_id))
                .filter(exercise_sessions::workout_session_id.eq(session.id))
                .select(SetSession::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| {
                    AppError::with_details(
                        ErrorCode::SetSessionNotFound,
                        "set does not belong to this workout",
                        serde_json::json!({ "set_id": result.set_id }),
                    )
                })?;

            let completed = result.completed.unwrap_or(current.completed);
            let completed_at = match (current.completed, completed) {
                (false, true) => Some(now),
                (_, false) => None,
                (true, true) => current.completed_at,
            };

            diesel::update(set_sessions::table.find(current.id))
                .set((
                    set_sessions::load.eq(result.load.or(current.load)),
                    set_sessions::reps.eq(result.reps.or(current.reps)),
                    set_sessions::completed.eq(completed),
                    set_sessions::completed_at.eq(completed_at),
                ))
                .execute(conn)?;
        }
        Ok(())
    })?;

    tracing::info!(workout_session_id = %id, sets = req.sets.len(), "sets recorded");

    Ok(Json(ApiResponse::ok(workout_service::load_detail(&mut conn, session)?)))
}

// --- PUT /workout/:id/exercises/:exercise_session_id ---

pub async fn update_exercise_session(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
    Path((id, exercise_session_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ExerciseSessionRequest>,
) -> AppResult<Json<ApiResponse<ExerciseSession>>> {
    let mut conn = db::conn(&state.db)?;
    let session = workout_service::find_own_session(&mut conn, id, user.id)?;
    workout_service::require_in_progress(&session)?;

    let current: ExerciseSession = exercise_sessions::table
        .find(exercise_session_id)
        .filter(exercise_sessions::workout_session_id.eq(session.id))
        .select(ExerciseSession::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ExerciseSessionNotFound, "exercise session not found"))?;

    let updated = workout_service::set_exercise_status(&mut conn, &current, req.status)?;

    tracing::info!(
        workout_session_id = %id,
        exercise_session_id = %exercise_session_id,
        from = %current.status,
        to = %updated.status,
        "exercise session status changed"
    );

    Ok(Json(ApiResponse::ok(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_list_is_rejected() {
        let req = RecordSetsRequest { sets: Vec::new() };
        assert_eq!(req.check().unwrap_err().error_code(), ErrorCode::BadRequest);
    }

    #[test]
    fn negative_load_is_rejected() {
        let req = RecordSetsRequest {
            sets: vec![SetResult { set_id: Uuid::new_v4(), load: Some(-5.0), reps: Some(8), completed: Some(true) }],
        };
        assert!(req.check().is_err());
    }

    #[test]
    fn finish_request_uses_status_codes() {
        let req: FinishWorkoutRequest = serde_json::from_value(serde_json::json!({ "status": "C" })).unwrap();
        assert_eq!(req.status, WorkoutSessionStatus::Completed);
    }
}
