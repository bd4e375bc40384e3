use std::collections::HashSet;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{ExerciseTemplate, Routine, WorkoutTemplate};
use crate::schema::{exercise_templates, workout_templates};
use crate::services::routine_service;

/// A workout template with its exercises in position order.
#[derive(Debug, Serialize)]
pub struct WorkoutTemplateDetail {
    #[serde(flatten)]
    pub template: WorkoutTemplate,
    pub exercises: Vec<ExerciseTemplate>,
}

/// Checks that `requested` lists every id in `current` exactly once.
pub fn validate_reorder(current: &[Uuid], requested: &[Uuid]) -> AppResult<()> {
    let wanted: HashSet<&Uuid> = requested.iter().collect();
    if wanted.len() != requested.len() {
        return Err(AppError::new(ErrorCode::InvalidReorder, "exercise ids must not repeat"));
    }
    let existing: HashSet<&Uuid> = current.iter().collect();
    if wanted != existing {
        return Err(AppError::with_details(
            ErrorCode::InvalidReorder,
            "reorder must list every exercise of the template exactly once",
            serde_json::json!({
                "missing": existing.difference(&wanted).collect::<Vec<_>>(),
                "unknown": wanted.difference(&existing).collect::<Vec<_>>(),
            }),
        ));
    }
    Ok(())
}

pub fn find_template(conn: &mut PgConnection, template_id: Uuid) -> AppResult<WorkoutTemplate> {
    workout_templates::table
        .find(template_id)
        .filter(workout_templates::status.eq(true))
        .select(WorkoutTemplate::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::WorkoutTemplateNotFound, "workout template not found"))
}

/// Loads a template whose routine is authored by `user_id`.
pub fn find_owned_template(
    conn: &mut PgConnection,
    template_id: Uuid,
    user_id: Uuid,
) -> AppResult<(WorkoutTemplate, Routine)> {
    let template = find_template(conn, template_id)?;
    let routine = routine_service::find_owned_routine(conn, template.routine_id, user_id)?;
    Ok((template, routine))
}

pub fn find_exercise_template(conn: &mut PgConnection, id: Uuid) -> AppResult<ExerciseTemplate> {
    exercise_templates::table
        .find(id)
        .select(ExerciseTemplate::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ExerciseTemplateNotFound, "exercise template not found"))
}

pub fn list_exercises(conn: &mut PgConnection, template_id: Uuid) -> AppResult<Vec<ExerciseTemplate>> {
    let items = exercise_templates::table
        .filter(exercise_templates::workout_template_id.eq(template_id))
        .order((exercise_templates::position.asc(), exercise_templates::created_at.asc()))
        .select(ExerciseTemplate::as_select())
        .load(conn)?;
    Ok(items)
}

pub fn load_detail(conn: &mut PgConnection, template: WorkoutTemplate) -> AppResult<WorkoutTemplateDetail> {
    let exercises = list_exercises(conn, template.id)?;
    Ok(WorkoutTemplateDetail { template, exercises })
}

/// Position for an exercise appended to the end of a template.
pub fn next_position(conn: &mut PgConnection, template_id: Uuid) -> AppResult<i32> {
    let max: Option<i32> = exercise_templates::table
        .filter(exercise_templates::workout_template_id.eq(template_id))
        .select(diesel::dsl::max(exercise_templates::position))
        .get_result(conn)?;
    Ok(max.map_or(0, |m| m + 1))
}

/// Rewrites positions to `0..n` following `ordered_ids`, all or nothing.
pub fn reorder(
    conn: &mut PgConnection,
    template_id: Uuid,
    ordered_ids: &[Uuid],
) -> AppResult<Vec<ExerciseTemplate>> {
    conn.transaction::<_, AppError, _>(|conn| {
        let current: Vec<Uuid> = exercise_templates::table
            .filter(exercise_templates::workout_template_id.eq(template_id))
            .select(exercise_templates::id)
            .load(conn)?;
        validate_reorder(&current, ordered_ids)?;

        for (position, id) in ordered_ids.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| AppError::new(ErrorCode::InvalidReorder, "too many exercises"))?;
            diesel::update(exercise_templates::table.find(*id))
                .set(exercise_templates::position.eq(position))
                .execute(conn)?;
        }

        list_exercises(conn, template_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use nutrifit_shared::types::auth::UserProfile;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn permutation_is_accepted() {
        let current = ids(3);
        let requested = vec![current[2], current[0], current[1]];
        assert!(validate_reorder(&current, &requested).is_ok());
    }

    #[test]
    fn missing_id_is_rejected() {
        let current = ids(3);
        let err = validate_reorder(&current, &current[..2]).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidReorder);
    }

    #[test]
    fn foreign_id_is_rejected() {
        let current = ids(2);
        let requested = vec![current[0], Uuid::new_v4()];
        let err = validate_reorder(&current, &requested).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidReorder);
    }

    #[test]
    fn duplicates_are_rejected() {
        let current = ids(2);
        let requested = vec![current[0], current[0], current[1]];
        let err = validate_reorder(&current, &requested).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidReorder);
    }

    #[test]
    fn empty_template_accepts_empty_order() {
        assert!(validate_reorder(&[], &[]).is_ok());
    }

    #[test]
    fn reorder_persists_new_positions() {
        let Some(mut conn) = test_support::db() else { return };
        let trainer = test_support::user(&mut conn, UserProfile::Personal);
        let routine = test_support::routine(&mut conn, &trainer, Some(6));
        let squat = test_support::exercise(&mut conn, "Back squat");
        let row = test_support::exercise(&mut conn, "Barbell row");
        let press = test_support::exercise(&mut conn, "Overhead press");
        let (template, items) = test_support::template(
            &mut conn,
            &routine,
            &[(&squat, 5, 5, Some(100.0)), (&row, 4, 8, None), (&press, 3, 10, None)],
        );

        let wanted = vec![items[2].id, items[0].id, items[1].id];
        reorder(&mut conn, template.id, &wanted).unwrap();

        let stored = list_exercises(&mut conn, template.id).unwrap();
        assert_eq!(stored.iter().map(|e| e.id).collect::<Vec<_>>(), wanted);
        assert_eq!(stored.iter().map(|e| e.position).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn rejected_reorder_leaves_positions_alone() {
        let Some(mut conn) = test_support::db() else { return };
        let trainer = test_support::user(&mut conn, UserProfile::Personal);
        let routine = test_support::routine(&mut conn, &trainer, None);
        let squat = test_support::exercise(&mut conn, "Front squat");
        let lunge = test_support::exercise(&mut conn, "Walking lunge");
        let (template, items) =
            test_support::template(&mut conn, &routine, &[(&squat, 3, 8, None), (&lunge, 3, 12, None)]);

        let err = reorder(&mut conn, template.id, &[items[1].id]).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidReorder);

        let stored = list_exercises(&mut conn, template.id).unwrap();
        assert_eq!(stored.iter().map(|e| e.id).collect::<Vec<_>>(), vec![items[0].id, items[1].id]);
    }
}
