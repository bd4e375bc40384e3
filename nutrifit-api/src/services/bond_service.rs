use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::types::auth::UserProfile;

use crate::models::Bond;
use crate::schema::customer_professional_bonds as bonds;
use crate::status::{Actor, BondStatus};

/// The two parties of a bond, ordered by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondParties {
    pub customer_id: Uuid,
    pub professional_id: Uuid,
}

/// Works out which side is the customer when `caller` proposes a bond to `other`.
/// Exactly one of them must be a professional and the other a customer.
pub fn resolve_parties(
    caller: (Uuid, UserProfile),
    other: (Uuid, UserProfile),
) -> AppResult<BondParties> {
    if caller.0 == other.0 {
        return Err(AppError::new(ErrorCode::InvalidBondParties, "cannot bond with yourself"));
    }
    match (caller.1.is_customer(), other.1.is_customer()) {
        (true, false) => Ok(BondParties { customer_id: caller.0, professional_id: other.0 }),
        (false, true) => Ok(BondParties { customer_id: other.0, professional_id: caller.0 }),
        _ => Err(AppError::new(
            ErrorCode::InvalidBondParties,
            "a bond links one customer and one professional",
        )),
    }
}

/// Sender or recipient, from the point of view of `user_id`.
pub fn actor_for(sender_id: Uuid, user_id: Uuid) -> Actor {
    if sender_id == user_id {
        Actor::Sender
    } else {
        Actor::Recipient
    }
}

pub fn find_bond(conn: &mut PgConnection, bond_id: Uuid) -> AppResult<Bond> {
    bonds::table
        .find(bond_id)
        .select(Bond::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::BondNotFound, "bond not found"))
}

/// Loads a bond and checks that `user_id` is one of its parties.
pub fn find_party_bond(conn: &mut PgConnection, bond_id: Uuid, user_id: Uuid) -> AppResult<Bond> {
    let bond = find_bond(conn, bond_id)?;
    if !bond.is_party(user_id) {
        return Err(AppError::new(ErrorCode::NotBondParty, "you are not a party of this bond"));
    }
    Ok(bond)
}

/// Most recent bond between the pair whose status is one of `statuses`.
pub fn find_bond_between(
    conn: &mut PgConnection,
    parties: BondParties,
    statuses: &[BondStatus],
) -> AppResult<Option<Bond>> {
    let bond = bonds::table
        .filter(bonds::customer_id.eq(parties.customer_id))
        .filter(bonds::professional_id.eq(parties.professional_id))
        .filter(bonds::status.eq_any(statuses.to_vec()))
        .order(bonds::created_at.desc())
        .select(Bond::as_select())
        .first(conn)
        .optional()?;
    Ok(bond)
}

/// An accepted bond is what lets a professional plan for and meet a customer.
pub fn require_accepted_bond(conn: &mut PgConnection, parties: BondParties) -> AppResult<Bond> {
    find_bond_between(conn, parties, &[BondStatus::Accepted])?.ok_or_else(|| {
        AppError::new(ErrorCode::BondNotAccepted, "an accepted bond between both users is required")
    })
}

/// Moves `bond` to `next`, provided nobody changed its status since it was read.
pub fn set_status(conn: &mut PgConnection, bond: &Bond, next: BondStatus) -> AppResult<Bond> {
    diesel::update(
        bonds::table
            .filter(bonds::id.eq(bond.id))
            .filter(bonds::status.eq(bond.status)),
    )
    .set(bonds::status.eq(next))
    .returning(Bond::as_returning())
    .get_result(conn)
    .optional()?
    .ok_or_else(|| {
        AppError::with_details(
            ErrorCode::InvalidBondTransition,
            "bond status was changed by another request",
            serde_json::json!({ "bond_id": bond.id, "expected": bond.status }),
        )
    })
}

/// Pending and accepted bonds where `customer_id` is the customer, newest first.
pub fn list_active_for_customer(conn: &mut PgConnection, customer_id: Uuid) -> AppResult<Vec<Bond>> {
    let items = bonds::table
        .filter(bonds::customer_id.eq(customer_id))
        .filter(bonds::status.eq_any(vec![BondStatus::Pending, BondStatus::Accepted]))
        .order(bonds::created_at.desc())
        .select(Bond::as_select())
        .load(conn)?;
    Ok(items)
}
