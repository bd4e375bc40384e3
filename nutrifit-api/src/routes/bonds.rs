use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::middleware::{CustomerUser, ProfessionalUser};
use nutrifit_shared::types::auth::AuthUser;
use nutrifit_shared::types::pagination::{default_page, default_per_page, Paginated, PaginationParams};
use nutrifit_shared::types::ApiResponse;

use crate::models::{Bond, NewBond};
use crate::schema::customer_professional_bonds as bonds;
use crate::services::{bond_service, user_service};
use crate::status::BondStatus;
use crate::AppState;

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct CreateBondRequest {
    pub customer_id: Uuid,
    pub professional_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBondRequest {
    pub status: BondStatus,
}

#[derive(Debug, Deserialize)]
pub struct BondFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub status: Option<BondStatus>,
}

impl BondFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }
}

fn professional_bonds_query(professional_id: Uuid, status: Option<BondStatus>) -> bonds::BoxedQuery<'static, Pg> {
    let mut query = bonds::table
        .filter(bonds::professional_id.eq(professional_id))
        .into_boxed();
    if let Some(status) = status {
        query = query.filter(bonds::status.eq(status));
    }
    query
}

// --- POST /bond ---

pub async fn create_bond(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBondRequest>,
) -> AppResult<Json<ApiResponse<Bond>>> {
    let other_id = if user.id == req.customer_id {
        req.professional_id
    } else if user.id == req.professional_id {
        req.customer_id
    } else {
        return Err(AppError::new(ErrorCode::NotBondParty, "you must be one of the bond parties"));
    };

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    let other = user_service::find_active_user(&mut conn, other_id)?;
    let parties = bond_service::resolve_parties((user.id, user.profile), (other.id, other.profile))?;
    if parties.customer_id != req.customer_id {
        return Err(AppError::new(
            ErrorCode::InvalidBondParties,
            "customer_id must reference the customer of the pair",
        ));
    }

    let bond = conn.transaction::<_, AppError, _>(|conn| {
        let existing =
            bond_service::find_bond_between(conn, parties, &[BondStatus::Pending, BondStatus::Accepted])?;
        if let Some(existing) = existing {
            return Err(AppError::with_details(
                ErrorCode::BondAlreadyExists,
                "an open bond already exists between these users",
                serde_json::json!({ "bond_id": existing.id, "status": existing.status }),
            ));
        }

        let bond = diesel::insert_into(bonds::table)
            .values(&NewBond {
                customer_id: parties.customer_id,
                professional_id: parties.professional_id,
                sender_id: user.id,
                status: BondStatus::Pending,
            })
            .returning(Bond::as_returning())
            .get_result(conn)?;
        Ok(bond)
    })?;

    tracing::info!(
        bond_id = %bond.id,
        customer_id = %bond.customer_id,
        professional_id = %bond.professional_id,
        sender_id = %bond.sender_id,
        "bond proposed"
    );

    Ok(Json(ApiResponse::ok(bond)))
}

// --- GET /bond ---

pub async fn list_as_professional(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<BondFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Bond>>>> {
    let pagination = params.pagination();
    let mut conn = db::conn(&state.db)?;

    let total: i64 = professional_bonds_query(user.id, params.status)
        .count()
        .get_result(&mut conn)?;
    let items = professional_bonds_query(user.id, params.status)
        .order(bonds::created_at.desc())
        .offset(pagination.offset())
        .limit(pagination.limit() as i64)
        .select(Bond::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &pagination))))
}

// --- GET /bond/sent ---

pub async fn list_sent(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Bond>>>> {
    let mut conn = db::conn(&state.db)?;

    let items = bonds::table
        .filter(bonds::sender_id.eq(user.id))
        .order(bonds::created_at.desc())
        .select(Bond::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

// --- GET /bond/as-customer ---

pub async fn list_as_customer(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Bond>>>> {
    let mut conn = db::conn(&state.db)?;

    let items = bond_service::list_active_for_customer(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(items)))
}

// --- GET /bond/:id ---

pub async fn get_bond(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Bond>>> {
    let mut conn = db::conn(&state.db)?;
    let bond = bond_service::find_party_bond(&mut conn, id, user.id)?;
    Ok(Json(ApiResponse::ok(bond)))
}

// --- PUT /bond/:id ---

pub async fn update_bond(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBondRequest>,
) -> AppResult<Json<ApiResponse<Bond>>> {
    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    let bond = bond_service::find_party_bond(&mut conn, id, user.id)?;

    let actor = bond_service::actor_for(bond.sender_id, user.id);
    let next = bond.status.transition(req.status, actor)?;

    let updated = bond_service::set_status(&mut conn, &bond, next)?;

    tracing::info!(bond_id = %id, from = %bond.status, to = %next, by = %user.id, "bond status changed");

    Ok(Json(ApiResponse::ok(updated)))
}

// --- DELETE /bond/:id ---

/// Withdraws a proposal that has not been answered yet.
pub async fn withdraw_bond(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Bond>>> {
    let mut conn = db::conn(&state.db)?;
    let bond = bond_service::find_party_bond(&mut conn, id, user.id)?;

    if bond.status != BondStatus::Pending {
        return Err(AppError::new(
            ErrorCode::InvalidBondTransition,
            "only pending bonds can be withdrawn; cancel accepted bonds instead",
        ));
    }
    let actor = bond_service::actor_for(bond.sender_id, user.id);
    let next = bond.status.transition(BondStatus::Cancelled, actor)?;

    let updated = bond_service::set_status(&mut conn, &bond, next)?;

    tracing::info!(bond_id = %id, by = %user.id, "bond proposal withdrawn");

    Ok(Json(ApiResponse::ok(updated)))
}
