use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::middleware::{CustomerUser, ProfessionalUser};
use nutrifit_shared::types::auth::AuthUser;
use nutrifit_shared::types::pagination::{Paginated, PaginationParams};
use nutrifit_shared::types::{ApiResponse, Removed};

use crate::models::{CustomerRoutine, NewRoutine, Routine, UpdateRoutine, WorkoutTemplate};
use crate::schema::{customer_routines, routines, workout_templates};
use crate::services::bond_service::{self, BondParties};
use crate::services::routine_service::{self, AssignedRoutine};
use crate::services::user_service;
use crate::status::{Difficulty, RoutineGoal};
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoutineRequest {
    #[validate(length(min = 1, max = 120, message = "title must be 1-120 characters"))]
    pub title: String,
    pub goal: RoutineGoal,
    pub difficulty: Difficulty,
    #[validate(range(min = 1, max = 104, message = "weeks must be between 1 and 104"))]
    pub weeks: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoutineRequest {
    #[validate(length(min = 1, max = 120, message = "title must be 1-120 characters"))]
    pub title: Option<String>,
    pub goal: Option<RoutineGoal>,
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 1, max = 104, message = "weeks must be between 1 and 104"))]
    pub weeks: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoutineRequest {
    pub routine_id: Uuid,
    pub customer_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NearExpiryParams {
    #[validate(range(min = 1, max = 365, message = "days must be between 1 and 365"))]
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RoutineDetail {
    #[serde(flatten)]
    pub routine: Routine,
    pub workout_templates: Vec<WorkoutTemplate>,
}

// --- POST /routine ---

pub async fn create_routine(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoutineRequest>,
) -> AppResult<Json<ApiResponse<Routine>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;

    let routine = diesel::insert_into(routines::table)
        .values(&NewRoutine {
            personal_id: user.id,
            title: req.title.trim().to_string(),
            goal: req.goal,
            difficulty: req.difficulty,
            weeks: req.weeks,
        })
        .returning(Routine::as_returning())
        .get_result(&mut conn)?;

    tracing::info!(routine_id = %routine.id, personal_id = %user.id, "routine created");

    Ok(Json(ApiResponse::ok(routine)))
}

// --- GET /routine ---

pub async fn list_authored(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Routine>>>> {
    let mut conn = db::conn(&state.db)?;

    let total: i64 = routines::table
        .filter(routines::personal_id.eq(user.id))
        .filter(routines::status.eq(true))
        .count()
        .get_result(&mut conn)?;

    let items = routines::table
        .filter(routines::personal_id.eq(user.id))
        .filter(routines::status.eq(true))
        .order(routines::created_at.desc())
        .offset(params.offset())
        .limit(params.limit() as i64)
        .select(Routine::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

// --- GET /routine/:id ---

pub async fn get_routine(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RoutineDetail>>> {
    let mut conn = db::conn(&state.db)?;
    let routine = routine_service::find_visible_routine(&mut conn, id, user.id)?;

    let templates = workout_templates::table
        .filter(workout_templates::routine_id.eq(id))
        .filter(workout_templates::status.eq(true))
        .order((workout_templates::position.asc(), workout_templates::created_at.asc()))
        .select(WorkoutTemplate::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(RoutineDetail { routine, workout_templates: templates })))
}

// --- PUT /routine/:id ---

pub async fn update_routine(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoutineRequest>,
) -> AppResult<Json<ApiResponse<Routine>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    let routine = routine_service::find_owned_routine(&mut conn, id, user.id)?;

    let changes = UpdateRoutine {
        title: req.title.map(|t| t.trim().to_string()),
        goal: req.goal,
        difficulty: req.difficulty,
        weeks: req.weeks,
    };
    if changes.is_empty() {
        return Ok(Json(ApiResponse::ok(routine)));
    }

    // Existing assignments keep the expiry computed when they were made.
    let updated = diesel::update(routines::table.find(id))
        .set(&changes)
        .returning(Routine::as_returning())
        .get_result(&mut conn)?;

    tracing::info!(routine_id = %id, "routine updated");

    Ok(Json(ApiResponse::ok(updated)))
}

// --- DELETE /routine/:id ---

pub async fn delete_routine(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let mut conn = db::conn(&state.db)?;
    routine_service::find_owned_routine(&mut conn, id, user.id)?;

    conn.transaction::<_, AppError, _>(|conn| {
        diesel::update(routines::table.find(id))
            .set(routines::status.eq(false))
            .execute(conn)?;
        let unassigned = diesel::update(
            customer_routines::table
                .filter(customer_routines::routine_id.eq(id))
                .filter(customer_routines::status.eq(true)),
        )
        .set(customer_routines::status.eq(false))
        .execute(conn)?;
        tracing::info!(routine_id = %id, unassigned, "routine deleted");
        Ok(())
    })?;

    Ok(Json(ApiResponse::ok(Removed::new(id))))
}

// --- GET /routine/my-routines ---

pub async fn list_assigned_to_me(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<AssignedRoutine>>>> {
    let mut conn = db::conn(&state.db)?;
    let now = Utc::now();

    let rows: Vec<(CustomerRoutine, Routine)> = customer_routines::table
        .inner_join(routines::table)
        .filter(customer_routines::customer_id.eq(user.id))
        .filter(customer_routines::status.eq(true))
        .filter(routines::status.eq(true))
        .order(customer_routines::created_at.desc())
        .select((CustomerRoutine::as_select(), Routine::as_select()))
        .load(&mut conn)?;

    let items = rows
        .into_iter()
        .map(|(assignment, routine)| AssignedRoutine::new(assignment, routine, now))
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}

// --- POST /routine/assign ---

pub async fn assign_routine(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssignRoutineRequest>,
) -> AppResult<Json<ApiResponse<AssignedRoutine>>> {
    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    let routine = routine_service::find_owned_routine(&mut conn, req.routine_id, user.id)?;

    let customer = user_service::find_active_user(&mut conn, req.customer_id)?;
    if !customer.profile.is_customer() {
        return Err(AppError::new(ErrorCode::CustomerRequired, "routines can only be assigned to customers"));
    }
    bond_service::require_accepted_bond(
        &mut conn,
        BondParties { customer_id: customer.id, professional_id: user.id },
    )?;

    if routine_service::is_assigned(&mut conn, routine.id, customer.id)? {
        return Err(AppError::new(ErrorCode::Conflict, "routine is already assigned to this customer"));
    }

    let now = Utc::now();
    let assignment = routine_service::assign(&mut conn, &routine, customer.id, now)?;

    tracing::info!(
        assignment_id = %assignment.id,
        routine_id = %routine.id,
        customer_id = %customer.id,
        expires_at = ?assignment.expires_at,
        "routine assigned"
    );

    Ok(Json(ApiResponse::ok(AssignedRoutine::new(assignment, routine, now))))
}

// --- DELETE /routine/assign/:id ---

/// The routine's author or the customer can end an assignment.
pub async fn unassign_routine(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    let mut conn = db::conn(&state.db)?;

    let (assignment, routine): (CustomerRoutine, Routine) = customer_routines::table
        .inner_join(routines::table)
        .filter(customer_routines::id.eq(id))
        .filter(customer_routines::status.eq(true))
        .select((CustomerRoutine::as_select(), Routine::as_select()))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerRoutineNotFound, "routine assignment not found"))?;

    if assignment.customer_id != user.id && routine.personal_id != user.id {
        return Err(AppError::new(ErrorCode::NotRoutineOwner, "you cannot change this assignment"));
    }

    diesel::update(customer_routines::table.find(id))
        .set(customer_routines::status.eq(false))
        .execute(&mut conn)?;

    tracing::info!(assignment_id = %id, routine_id = %routine.id, by = %user.id, "routine unassigned");

    Ok(Json(ApiResponse::ok(Removed::new(id))))
}

// --- GET /routine/near-expiry ---

/// Assignments expiring within `days`: a customer's own, or those of a professional's routines.
pub async fn list_near_expiry(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearExpiryParams>,
) -> AppResult<Json<ApiResponse<Vec<AssignedRoutine>>>> {
    params.validate()?;
    let days = params.days.unwrap_or(state.config.near_expiry_days);
    let now = Utc::now();
    let horizon = now + Duration::days(days);

    let mut conn = db::conn(&state.db)?;

    let mut query = customer_routines::table
        .inner_join(routines::table)
        .filter(customer_routines::status.eq(true))
        .filter(routines::status.eq(true))
        .filter(customer_routines::expires_at.ge(now))
        .filter(customer_routines::expires_at.le(horizon))
        .into_boxed();
    query = if user.is_customer() {
        query.filter(customer_routines::customer_id.eq(user.id))
    } else {
        query.filter(routines::personal_id.eq(user.id))
    };

    let rows: Vec<(CustomerRoutine, Routine)> = query
        .order(customer_routines::expires_at.asc())
        .select((CustomerRoutine::as_select(), Routine::as_select()))
        .load(&mut conn)?;

    let items = rows
        .into_iter()
        .map(|(assignment, routine)| AssignedRoutine::new(assignment, routine, now))
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}
