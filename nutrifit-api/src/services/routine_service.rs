use chrono::{DateTime, Duration, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{CustomerRoutine, NewCustomerRoutine, Routine};
use crate::schema::{customer_routines, routines};

const SECONDS_PER_DAY: i64 = 86_400;

/// `created_at + weeks * 7 days` for a positive week count, otherwise no expiry.
pub fn routine_expires_at(created_at: DateTime<Utc>, weeks: Option<i32>) -> Option<DateTime<Utc>> {
    match weeks {
        Some(w) if w > 0 => Some(created_at + Duration::days(i64::from(w) * 7)),
        _ => None,
    }
}

/// Whole days left before `expires_at`, rounded up; zero once expired.
pub fn days_remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    expires_at.map(|exp| {
        let secs = (exp - now).num_seconds();
        if secs <= 0 {
            0
        } else {
            (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
        }
    })
}

/// A routine assignment as shown to the customer.
#[derive(Debug, Serialize)]
pub struct AssignedRoutine {
    pub assignment_id: Uuid,
    pub customer_id: Uuid,
    pub routine: Routine,
    pub assigned_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
}

impl AssignedRoutine {
    pub fn new(assignment: CustomerRoutine, routine: Routine, now: DateTime<Utc>) -> Self {
        Self {
            assignment_id: assignment.id,
            customer_id: assignment.customer_id,
            days_remaining: days_remaining(assignment.expires_at, now),
            expires_at: assignment.expires_at,
            assigned_at: assignment.created_at,
            routine,
        }
    }
}

/// Loads an active routine.
pub fn find_routine(conn: &mut PgConnection, routine_id: Uuid) -> AppResult<Routine> {
    routines::table
        .find(routine_id)
        .filter(routines::status.eq(true))
        .select(Routine::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RoutineNotFound, "routine not found"))
}

/// Loads an active routine authored by `user_id`.
pub fn find_owned_routine(conn: &mut PgConnection, routine_id: Uuid, user_id: Uuid) -> AppResult<Routine> {
    let routine = find_routine(conn, routine_id)?;
    if routine.personal_id != user_id {
        return Err(AppError::new(ErrorCode::NotRoutineOwner, "only the author can change this routine"));
    }
    Ok(routine)
}

/// The author and every customer with an active assignment may read a routine.
pub fn find_visible_routine(conn: &mut PgConnection, routine_id: Uuid, user_id: Uuid) -> AppResult<Routine> {
    let routine = find_routine(conn, routine_id)?;
    if routine.personal_id == user_id || is_assigned(conn, routine_id, user_id)? {
        return Ok(routine);
    }
    Err(AppError::new(ErrorCode::NotRoutineOwner, "routine is not shared with you"))
}

pub fn is_assigned(conn: &mut PgConnection, routine_id: Uuid, customer_id: Uuid) -> AppResult<bool> {
    let count: i64 = customer_routines::table
        .filter(customer_routines::routine_id.eq(routine_id))
        .filter(customer_routines::customer_id.eq(customer_id))
        .filter(customer_routines::status.eq(true))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Records the assignment of `routine` to `customer_id`, expiring after its weeks.
pub fn assign(
    conn: &mut PgConnection,
    routine: &Routine,
    customer_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<CustomerRoutine> {
    let assignment = diesel::insert_into(customer_routines::table)
        .values(&NewCustomerRoutine {
            routine_id: routine.id,
            customer_id,
            expires_at: routine_expires_at(now, routine.weeks),
            created_at: now,
        })
        .returning(CustomerRoutine::as_returning())
        .get_result(conn)?;
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use nutrifit_shared::types::auth::UserProfile;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn four_weeks_expire_after_28_days() {
        let created = at(1, 9);
        assert_eq!(routine_expires_at(created, Some(4)), Some(created + Duration::days(28)));
    }

    #[test]
    fn missing_or_non_positive_weeks_never_expire() {
        assert_eq!(routine_expires_at(at(1, 9), None), None);
        assert_eq!(routine_expires_at(at(1, 9), Some(0)), None);
        assert_eq!(routine_expires_at(at(1, 9), Some(-2)), None);
    }

    #[test]
    fn days_remaining_rounds_partial_days_up() {
        let expires = Some(at(10, 12));
        assert_eq!(days_remaining(expires, at(10, 11)), Some(1));
        assert_eq!(days_remaining(expires, at(8, 12)), Some(2));
        assert_eq!(days_remaining(expires, at(8, 13)), Some(2));
    }

    #[test]
    fn expired_routines_report_zero_days() {
        assert_eq!(days_remaining(Some(at(5, 0)), at(6, 0)), Some(0));
        assert_eq!(days_remaining(Some(at(5, 0)), at(5, 0)), Some(0));
        assert_eq!(days_remaining(None, at(5, 0)), None);
    }

    #[test]
    fn stored_assignment_expires_four_weeks_after_creation() {
        let Some(mut conn) = test_support::db() else { return };
        let trainer = test_support::user(&mut conn, UserProfile::Personal);
        let student = test_support::user(&mut conn, UserProfile::Student);
        let routine = test_support::routine(&mut conn, &trainer, Some(4));

        let assignment = assign(&mut conn, &routine, student.id, Utc::now()).unwrap();

        let stored: CustomerRoutine = customer_routines::table
            .find(assignment.id)
            .select(CustomerRoutine::as_select())
            .first(&mut conn)
            .unwrap();
        assert_eq!(stored.expires_at, Some(stored.created_at + Duration::days(28)));
        assert!(is_assigned(&mut conn, routine.id, student.id).unwrap());
    }

    #[test]
    fn stored_assignment_without_weeks_never_expires() {
        let Some(mut conn) = test_support::db() else { return };
        let trainer = test_support::user(&mut conn, UserProfile::Personal);
        let student = test_support::user(&mut conn, UserProfile::Student);
        let routine = test_support::routine(&mut conn, &trainer, None);

        let assignment = assign(&mut conn, &routine, student.id, Utc::now()).unwrap();
        assert_eq!(assignment.expires_at, None);
    }
}
