use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Address, ProfessionalCredential, ProfessionalDetails, User};
use crate::schema::{
    addresses, customer_feedbacks, professional_credentials, professional_details, professional_feedbacks, users,
};

/// A user with everything shown on their profile page.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub address: Option<Address>,
    pub credential: Option<ProfessionalCredential>,
    pub details: Option<ProfessionalDetails>,
    pub average_rating: Option<f64>,
    pub feedback_count: usize,
}

/// Mean of the given ratings, `None` when there are none.
pub fn average_rating(ratings: &[i16]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    Some(sum as f64 / ratings.len() as f64)
}

pub fn find_active_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    users::table
        .find(user_id)
        .filter(users::status.eq(true))
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}

/// Tokens stay valid after an account is removed, so writes re-check the caller.
pub fn require_active_caller(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    find_active_user(conn, user_id).map_err(|e| match e.error_code() {
        ErrorCode::UserNotFound => AppError::new(ErrorCode::Unauthorized, "account is no longer active"),
        _ => e,
    })
}

pub fn find_active_professional(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    let user = find_active_user(conn, user_id)?;
    if !user.profile.is_professional() {
        return Err(AppError::new(ErrorCode::ProfessionalRequired, "user is not a professional"));
    }
    Ok(user)
}

/// Ratings the user has received, from the side matching their profile.
pub fn received_ratings(conn: &mut PgConnection, user: &User) -> AppResult<Vec<i16>> {
    let ratings = if user.profile.is_professional() {
        professional_feedbacks::table
            .filter(professional_feedbacks::professional_id.eq(user.id))
            .filter(professional_feedbacks::status.eq(true))
            .select(professional_feedbacks::rating)
            .load(conn)?
    } else {
        customer_feedbacks::table
            .filter(customer_feedbacks::customer_id.eq(user.id))
            .filter(customer_feedbacks::status.eq(true))
            .select(customer_feedbacks::rating)
            .load(conn)?
    };
    Ok(ratings)
}

pub fn load_detail(conn: &mut PgConnection, user: User) -> AppResult<UserDetail> {
    let address = match user.address_id {
        Some(address_id) => addresses::table
            .find(address_id)
            .select(Address::as_select())
            .first(conn)
            .optional()?,
        None => None,
    };

    let (credential, details) = if user.profile.is_professional() {
        let credential = professional_credentials::table
            .filter(professional_credentials::professional_id.eq(user.id))
            .filter(professional_credentials::status.eq(true))
            .select(ProfessionalCredential::as_select())
            .first(conn)
            .optional()?;
        let details = professional_details::table
            .filter(professional_details::professional_id.eq(user.id))
            .filter(professional_details::status.eq(true))
            .select(ProfessionalDetails::as_select())
            .first(conn)
            .optional()?;
        (credential, details)
    } else {
        (None, None)
    };

    let ratings = received_ratings(conn, &user)?;

    Ok(UserDetail {
        address,
        credential,
        details,
        average_rating: average_rating(&ratings),
        feedback_count: ratings.len(),
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use nutrifit_shared::types::auth::UserProfile;

    #[test]
    fn average_of_ratings() {
        assert_eq!(average_rating(&[5, 4, 3]), Some(4.0));
        assert_eq!(average_rating(&[5, 4]), Some(4.5));
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn removed_account_cannot_write() {
        let Some(mut conn) = test_support::db() else { return };
        let student = test_support::user(&mut conn, UserProfile::Student);
        assert_eq!(require_active_caller(&mut conn, student.id).unwrap().id, student.id);

        diesel::update(users::table.find(student.id))
            .set(users::status.eq(false))
            .execute(&mut conn)
            .unwrap();

        let err = require_active_caller(&mut conn, student.id).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::Unauthorized);
    }
}
