use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::middleware::{CustomerUser, ProfessionalUser};
use nutrifit_shared::types::auth::AuthUser;
use nutrifit_shared::types::ApiResponse;

use crate::models::{Address, Appointment, Bond, NewAddress, NewAppointment};
use crate::schema::{addresses, appointments, customer_professional_bonds as bonds};
use crate::services::{bond_service, user_service};
use crate::status::{AppointmentStatus, AppointmentType, BondStatus};
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    pub bond_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "type", alias = "appointment_type")]
    pub appointment_type: AppointmentType,
    #[validate]
    pub address: Option<NewAddress>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub address: Option<Address>,
}

/// Presential meetings need a place; online ones must not carry one.
pub fn check_address(appointment_type: AppointmentType, has_address: bool) -> AppResult<()> {
    match (appointment_type, has_address) {
        (AppointmentType::Presential, false) => Err(AppError::new(
            ErrorCode::AddressRequired,
            "presential appointments require an address",
        )),
        (AppointmentType::Online, true) => Err(AppError::new(
            ErrorCode::AddressNotAllowed,
            "online appointments cannot have an address",
        )),
        _ => Ok(()),
    }
}

fn find_appointment(conn: &mut PgConnection, id: Uuid) -> AppResult<Appointment> {
    appointments::table
        .find(id)
        .select(Appointment::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::AppointmentNotFound, "appointment not found"))
}

/// Loads an appointment together with its bond, checking that `user_id` is a party.
fn find_party_appointment(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> AppResult<(Appointment, Bond)> {
    let appointment = find_appointment(conn, id)?;
    let bond = bond_service::find_party_bond(conn, appointment.bond_id, user_id)?;
    Ok((appointment, bond))
}

fn load_detail(conn: &mut PgConnection, appointment: Appointment) -> AppResult<AppointmentDetail> {
    let address = match appointment.address_id {
        Some(address_id) => addresses::table
            .find(address_id)
            .select(Address::as_select())
            .first(conn)
            .optional()?,
        None => None,
    };
    Ok(AppointmentDetail { appointment, address })
}

// --- POST /appointment ---

pub async fn create_appointment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAppointmentRequest>,
) -> AppResult<Json<ApiResponse<AppointmentDetail>>> {
    req.validate()?;
    check_address(req.appointment_type, req.address.is_some())?;

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    let bond = bond_service::find_party_bond(&mut conn, req.bond_id, user.id)?;
    if bond.status != BondStatus::Accepted {
        return Err(AppError::new(
            ErrorCode::BondNotAccepted,
            "appointments can only be scheduled on an accepted bond",
        ));
    }

    let appointment = conn.transaction::<_, AppError, _>(|conn| {
        let address_id = match &req.address {
            Some(address) => Some(
                diesel::insert_into(addresses::table)
                    .values(address)
                    .returning(addresses::id)
                    .get_result::<Uuid>(conn)?,
            ),
            None => None,
        };

        let appointment = diesel::insert_into(appointments::table)
            .values(&NewAppointment {
                bond_id: bond.id,
                requested_by: user.id,
                scheduled_at: req.scheduled_at,
                appointment_type: req.appointment_type,
                address_id,
                status: AppointmentStatus::Pending,
            })
            .returning(Appointment::as_returning())
            .get_result(conn)?;
        Ok(appointment)
    })?;

    tracing::info!(
        appointment_id = %appointment.id,
        bond_id = %bond.id,
        requested_by = %user.id,
        scheduled_at = %appointment.scheduled_at,
        "appointment requested"
    );

    Ok(Json(ApiResponse::ok(load_detail(&mut conn, appointment)?)))
}

// --- GET /appointment/:id ---

pub async fn get_appointment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<AppointmentDetail>>> {
    let mut conn = db::conn(&state.db)?;
    let (appointment, _) = find_party_appointment(&mut conn, id, user.id)?;
    Ok(Json(ApiResponse::ok(load_detail(&mut conn, appointment)?)))
}

// --- PUT /appointment/:id ---

/// Either moves the appointment through its lifecycle or reschedules it.
pub async fn update_appointment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> AppResult<Json<ApiResponse<AppointmentDetail>>> {
    match (&req.status, &req.scheduled_at) {
        (Some(_), Some(_)) => {
            return Err(AppError::bad_request("change status or reschedule, not both at once"));
        }
        (None, None) => return Err(AppError::bad_request("nothing to update")),
        _ => {}
    }

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    let (appointment, bond) = find_party_appointment(&mut conn, id, user.id)?;
    check_bond_allows(bond.status, req.status)?;

    let updated: Appointment = if let Some(scheduled_at) = req.scheduled_at {
        if !appointment.status.can_reschedule() {
            return Err(AppError::new(
                ErrorCode::InvalidAppointmentTransition,
                format!("cannot reschedule an appointment in status {}", appointment.status),
            ));
        }
        // The other party has to confirm the new time.
        let updated = diesel::update(
            appointments::table
                .filter(appointments::id.eq(id))
                .filter(appointments::status.eq(appointment.status)),
        )
        .set((
            appointments::scheduled_at.eq(scheduled_at),
            appointments::status.eq(AppointmentStatus::Pending),
            appointments::requested_by.eq(user.id),
        ))
        .returning(Appointment::as_returning())
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(|| status_changed(&appointment))?;
        tracing::info!(appointment_id = %id, scheduled_at = %scheduled_at, by = %user.id, "appointment rescheduled");
        updated
    } else {
        let requested = req.status.unwrap_or(appointment.status);
        let actor = bond_service::actor_for(appointment.requested_by, user.id);
        let next = appointment.status.transition(requested, actor)?;
        let updated = diesel::update(
            appointments::table
                .filter(appointments::id.eq(id))
                .filter(appointments::status.eq(appointment.status)),
        )
        .set(appointments::status.eq(next))
        .returning(Appointment::as_returning())
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(|| status_changed(&appointment))?;
        tracing::info!(appointment_id = %id, from = %appointment.status, to = %next, by = %user.id, "appointment status changed");
        updated
    };

    Ok(Json(ApiResponse::ok(load_detail(&mut conn, updated)?)))
}

/// Confirming or moving a meeting needs a live bond. Rejecting or cancelling
/// one stays possible after the bond has ended. `None` stands for a reschedule.
pub fn check_bond_allows(bond_status: BondStatus, change: Option<AppointmentStatus>) -> AppResult<()> {
    let needs_accepted_bond = matches!(change, None | Some(AppointmentStatus::Accepted));
    if needs_accepted_bond && bond_status != BondStatus::Accepted {
        return Err(AppError::new(
            ErrorCode::BondNotAccepted,
            "the bond behind this appointment is no longer accepted",
        ));
    }
    Ok(())
}

fn status_changed(appointment: &Appointment) -> AppError {
    AppError::with_details(
        ErrorCode::InvalidAppointmentTransition,
        "appointment status was changed by another request",
        serde_json::json!({ "appointment_id": appointment.id, "expected": appointment.status }),
    )
}

// --- GET /appointment/bond/:bond_id ---

pub async fn list_by_bond(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(bond_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Appointment>>>> {
    let mut conn = db::conn(&state.db)?;
    bond_service::find_party_bond(&mut conn, bond_id, user.id)?;

    let items = appointments::table
        .filter(appointments::bond_id.eq(bond_id))
        .order(appointments::scheduled_at.asc())
        .select(Appointment::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

// --- GET /appointment/customer/all ---

pub async fn list_as_customer(
    CustomerUser(user): CustomerUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Appointment>>>> {
    let mut conn = db::conn(&state.db)?;

    let items = appointments::table
        .inner_join(bonds::table)
        .filter(bonds::customer_id.eq(user.id))
        .order(appointments::scheduled_at.asc())
        .select(Appointment::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

// --- GET /appointment/professional/all ---

pub async fn list_as_professional(
    ProfessionalUser(user): ProfessionalUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Appointment>>>> {
    let mut conn = db::conn(&state.db)?;

    let items = appointments::table
        .inner_join(bonds::table)
        .filter(bonds::professional_id.eq(user.id))
        .order(appointments::scheduled_at.asc())
        .select(Appointment::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presential_requires_address() {
        let err = check_address(AppointmentType::Presential, false).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::AddressRequired);
        assert!(check_address(AppointmentType::Presential, true).is_ok());
    }

    #[test]
    fn online_rejects_address() {
        let err = check_address(AppointmentType::Online, true).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::AddressNotAllowed);
        assert!(check_address(AppointmentType::Online, false).is_ok());
    }

    #[test]
    fn create_request_accepts_type_code() {
        let req: CreateAppointmentRequest = serde_json::from_value(serde_json::json!({
            "bond_id": Uuid::nil(),
            "scheduled_at": "2024-05-01T14:00:00Z",
            "type": "O",
        }))
        .unwrap();
        assert_eq!(req.appointment_type, AppointmentType::Online);
        assert!(req.address.is_none());
    }

    #[test]
    fn accepting_or_rescheduling_needs_an_accepted_bond() {
        for ended in [BondStatus::Cancelled, BondStatus::Rejected, BondStatus::Pending] {
            let err = check_bond_allows(ended, Some(AppointmentStatus::Accepted)).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::BondNotAccepted);
            let err = check_bond_allows(ended, None).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::BondNotAccepted);
        }
        assert!(check_bond_allows(BondStatus::Accepted, Some(AppointmentStatus::Accepted)).is_ok());
        assert!(check_bond_allows(BondStatus::Accepted, None).is_ok());
    }

    #[test]
    fn cancelling_survives_an_ended_bond() {
        assert!(check_bond_allows(BondStatus::Cancelled, Some(AppointmentStatus::Cancelled)).is_ok());
        assert!(check_bond_allows(BondStatus::Cancelled, Some(AppointmentStatus::Rejected)).is_ok());
    }
}
