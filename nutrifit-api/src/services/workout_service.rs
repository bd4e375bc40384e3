use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{
    ExerciseSession, ExerciseTemplate, NewExerciseSession, NewSetSession, NewWorkoutSession, SetSession,
    WorkoutSession, WorkoutTemplate,
};
use crate::schema::{exercise_sessions, set_sessions, workout_sessions};
use crate::services::template_service;
use crate::status::{ExerciseSessionStatus, WorkoutSessionStatus};

#[derive(Debug, Serialize)]
pub struct ExerciseSessionDetail {
    #[serde(flatten)]
    pub session: ExerciseSession,
    pub sets: Vec<SetSession>,
}

/// A workout session with its exercises and their sets, in order.
#[derive(Debug, Serialize)]
pub struct WorkoutSessionDetail {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub exercises: Vec<ExerciseSessionDetail>,
}

/// Sum of `load * reps` over sets where both were recorded.
pub fn total_volume<'a>(sets: impl IntoIterator<Item = &'a SetSession>) -> f64 {
    sets.into_iter()
        .filter_map(|s| Some(s.load? * f64::from(s.reps?)))
        .sum()
}

/// One not-started exercise session per exercise template, keeping template order.
pub fn plan_exercise_sessions(workout_session_id: Uuid, templates: &[ExerciseTemplate]) -> Vec<NewExerciseSession> {
    templates
        .iter()
        .enumerate()
        .map(|(i, t)| NewExerciseSession {
            workout_session_id,
            exercise_template_id: Some(t.id),
            exercise_id: t.exercise_id,
            position: i32::try_from(i).unwrap_or(i32::MAX),
            status: ExerciseSessionStatus::NotStarted,
        })
        .collect()
}

/// Empty sets numbered from 1, pre-filled with the template's target load.
pub fn plan_set_sessions(exercise_session_id: Uuid, template: &ExerciseTemplate) -> Vec<NewSetSession> {
    (1..=template.target_sets.max(0))
        .map(|set_number| NewSetSession {
            exercise_session_id,
            set_number,
            load: template.target_load,
            reps: None,
        })
        .collect()
}

/// Creates the session, its exercise sessions and their sets in one transaction.
pub fn start_session(
    conn: &mut PgConnection,
    template: &WorkoutTemplate,
    customer_id: Uuid,
) -> AppResult<WorkoutSessionDetail> {
    conn.transaction::<_, AppError, _>(|conn| {
        let exercise_templates = template_service::list_exercises(conn, template.id)?;

        let session: WorkoutSession = diesel::insert_into(workout_sessions::table)
            .values(&NewWorkoutSession {
                workout_template_id: template.id,
                customer_id,
                status: WorkoutSessionStatus::InProgress,
                started_at: Utc::now(),
            })
            .returning(WorkoutSession::as_returning())
            .get_result(conn)?;

        let planned = plan_exercise_sessions(session.id, &exercise_templates);
        if planned.is_empty() {
            return Ok(WorkoutSessionDetail { session, exercises: Vec::new() });
        }
        let created: Vec<ExerciseSession> = diesel::insert_into(exercise_sessions::table)
            .values(&planned)
            .returning(ExerciseSession::as_returning())
            .get_results(conn)?;

        let mut exercises = Vec::with_capacity(created.len());
        for exercise_session in created {
            let sets = match exercise_templates
                .iter()
                .find(|t| Some(t.id) == exercise_session.exercise_template_id)
            {
                Some(t) => {
                    let new_sets = plan_set_sessions(exercise_session.id, t);
                    diesel::insert_into(set_sessions::table)
                        .values(&new_sets)
                        .returning(SetSession::as_returning())
                        .get_results(conn)?
                }
                None => Vec::new(),
            };
            exercises.push(ExerciseSessionDetail { session: exercise_session, sets });
        }
        exercises.sort_by_key(|e| e.session.position);

        tracing::info!(
            workout_session_id = %session.id,
            workout_template_id = %template.id,
            customer_id = %customer_id,
            exercises = exercises.len(),
            "workout session started"
        );

        Ok(WorkoutSessionDetail { session, exercises })
    })
}

pub fn find_session(conn: &mut PgConnection, session_id: Uuid) -> AppResult<WorkoutSession> {
    workout_sessions::table
        .find(session_id)
        .select(WorkoutSession::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::WorkoutSessionNotFound, "workout session not found"))
}

/// Loads a session performed by `customer_id`. Other users get a 404.
pub fn find_own_session(conn: &mut PgConnection, session_id: Uuid, customer_id: Uuid) -> AppResult<WorkoutSession> {
    let session = find_session(conn, session_id)?;
    if session.customer_id != customer_id {
        return Err(AppError::new(ErrorCode::WorkoutSessionNotFound, "workout session not found"));
    }
    Ok(session)
}

pub fn require_in_progress(session: &WorkoutSession) -> AppResult<()> {
    if session.status != WorkoutSessionStatus::InProgress {
        return Err(AppError::new(
            ErrorCode::WorkoutNotInProgress,
            format!("workout session is {}", session.status),
        ));
    }
    Ok(())
}

pub fn load_sets(conn: &mut PgConnection, session_id: Uuid) -> AppResult<Vec<SetSession>> {
    let sets = set_sessions::table
        .inner_join(exercise_sessions::table)
        .filter(exercise_sessions::workout_session_id.eq(session_id))
        .order((exercise_sessions::position.asc(), set_sessions::set_number.asc()))
        .select(SetSession::as_select())
        .load(conn)?;
    Ok(sets)
}

pub fn load_detail(conn: &mut PgConnection, session: WorkoutSession) -> AppResult<WorkoutSessionDetail> {
    let exercise_rows: Vec<ExerciseSession> = exercise_sessions::table
        .filter(exercise_sessions::workout_session_id.eq(session.id))
        .order(exercise_sessions::position.asc())
        .select(ExerciseSession::as_select())
        .load(conn)?;

    let sets = load_sets(conn, session.id)?;
    let exercises = exercise_rows
        .into_iter()
        .map(|es| {
            let own = sets.iter().filter(|s| s.exercise_session_id == es.id).cloned().collect();
            ExerciseSessionDetail { session: es, sets: own }
        })
        .collect();

    Ok(WorkoutSessionDetail { session, exercises })
}

/// Ends an in-progress session. Completion stores the total volume.
pub fn finish_session(
    conn: &mut PgConnection,
    session: WorkoutSession,
    next: WorkoutSessionStatus,
) -> AppResult<WorkoutSession> {
    let next = session.status.transition(next)?;
    let volume = match next {
        WorkoutSessionStatus::Completed => Some(total_volume(&load_sets(conn, session.id)?)),
        _ => None,
    };

    let updated: WorkoutSession = diesel::update(
        workout_sessions::table
            .filter(workout_sessions::id.eq(session.id))
            .filter(workout_sessions::status.eq(session.status)),
    )
    .set((
        workout_sessions::status.eq(next),
        workout_sessions::ended_at.eq(Some(Utc::now())),
        workout_sessions::total_volume.eq(volume),
    ))
    .returning(WorkoutSession::as_returning())
    .get_result(conn)
    .optional()?
    .ok_or_else(|| {
        AppError::with_details(
            ErrorCode::InvalidWorkoutTransition,
            "workout session status was changed by another request",
            serde_json::json!({ "workout_session_id": session.id, "expected": session.status }),
        )
    })?;

    tracing::info!(
        workout_session_id = %updated.id,
        status = %next,
        total_volume = ?volume,
        "workout session finished"
    );

    Ok(updated)
}

/// Moves one exercise of a session to `next`, stamping start and end times.
pub fn set_exercise_status(
    conn: &mut PgConnection,
    current: &ExerciseSession,
    next: ExerciseSessionStatus,
) -> AppResult<ExerciseSession> {
    let next = current.status.transition(next)?;
    let now = Utc::now();
    let started_at = match next {
        ExerciseSessionStatus::InProgress => Some(now),
        _ => current.started_at,
    };
    let ended_at = if next.is_finished() { Some(now) } else { current.ended_at };

    diesel::update(
        exercise_sessions::table
            .filter(exercise_sessions::id.eq(current.id))
            .filter(exercise_sessions::status.eq(current.status)),
    )
    .set((
        exercise_sessions::status.eq(next),
        exercise_sessions::started_at.eq(started_at),
        exercise_sessions::ended_at.eq(ended_at),
    ))
    .returning(ExerciseSession::as_returning())
    .get_result(conn)
    .optional()?
    .ok_or_else(|| {
        AppError::with_details(
            ErrorCode::InvalidExerciseTransition,
            "exercise session status was changed by another request",
            serde_json::json!({ "exercise_session_id": current.id, "expected": current.status }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use nutrifit_shared::types::auth::UserProfile;

    fn set(load: Option<f64>, reps: Option<i32>) -> SetSession {
        SetSession {
            id: Uuid::new_v4(),
            exercise_session_id: Uuid::nil(),
            set_number: 1,
            load,
            reps,
            completed: true,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn exercise_template(target_sets: i32, target_load: Option<f64>) -> ExerciseTemplate {
        ExerciseTemplate {
            id: Uuid::new_v4(),
            workout_template_id: Uuid::nil(),
            exercise_id: Uuid::new_v4(),
            position: 0,
            target_sets,
            target_reps: 10,
            target_load,
            rest_seconds: Some(90),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn volume_sums_load_times_reps() {
        let sets = [set(Some(60.0), Some(10)), set(Some(62.5), Some(8)), set(Some(20.0), Some(12))];
        assert_eq!(total_volume(&sets), 600.0 + 500.0 + 240.0);
    }

    #[test]
    fn volume_skips_incomplete_sets() {
        let sets = [set(Some(60.0), Some(10)), set(None, Some(10)), set(Some(80.0), None)];
        assert_eq!(total_volume(&sets), 600.0);
        assert_eq!(total_volume(&Vec::new()), 0.0);
    }

    #[test]
    fn exercise_sessions_follow_template_order() {
        let session_id = Uuid::new_v4();
        let templates = [exercise_template(3, None), exercise_template(4, None)];
        let planned = plan_exercise_sessions(session_id, &templates);
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].exercise_template_id, Some(templates[0].id));
        assert_eq!(planned[1].exercise_id, templates[1].exercise_id);
        assert_eq!(planned[1].position, 1);
        assert!(planned.iter().all(|p| p.status == ExerciseSessionStatus::NotStarted));
    }

    #[test]
    fn sets_are_numbered_from_one() {
        let template = exercise_template(3, Some(40.0));
        let planned = plan_set_sessions(Uuid::new_v4(), &template);
        let numbers: Vec<i32> = planned.iter().map(|s| s.set_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(planned.iter().all(|s| s.load == Some(40.0) && s.reps.is_none()));
    }

    fn started_session(conn: &mut PgConnection) -> WorkoutSessionDetail {
        let trainer = test_support::user(conn, UserProfile::Personal);
        let student = test_support::user(conn, UserProfile::Student);
        let routine = test_support::routine(conn, &trainer, Some(4));
        let bench = test_support::exercise(conn, "Bench press");
        let (template, _) = test_support::template(conn, &routine, &[(&bench, 3, 10, Some(50.0))]);
        start_session(conn, &template, student.id).unwrap()
    }

    #[test]
    fn finishing_stores_the_volume_on_the_row() {
        let Some(mut conn) = test_support::db() else { return };
        let detail = started_session(&mut conn);
        assert_eq!(detail.exercises.len(), 1);
        assert_eq!(detail.exercises[0].sets.len(), 3);

        for set in &detail.exercises[0].sets {
            diesel::update(set_sessions::table.find(set.id))
                .set((set_sessions::reps.eq(Some(10)), set_sessions::completed.eq(true)))
                .execute(&mut conn)
                .unwrap();
        }

        let finished = finish_session(&mut conn, detail.session.clone(), WorkoutSessionStatus::Completed).unwrap();
        assert_eq!(finished.total_volume, Some(1500.0));

        let reread = find_session(&mut conn, detail.session.id).unwrap();
        assert_eq!(reread.status, WorkoutSessionStatus::Completed);
        assert_eq!(reread.total_volume, Some(1500.0));
        assert!(reread.ended_at.is_some());
    }

    #[test]
    fn finishing_twice_from_the_same_snapshot_fails() {
        let Some(mut conn) = test_support::db() else { return };
        let detail = started_session(&mut conn);

        finish_session(&mut conn, detail.session.clone(), WorkoutSessionStatus::Cancelled).unwrap();
        let err = finish_session(&mut conn, detail.session.clone(), WorkoutSessionStatus::Completed).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidWorkoutTransition);

        let reread = find_session(&mut conn, detail.session.id).unwrap();
        assert_eq!(reread.status, WorkoutSessionStatus::Cancelled);
        assert_eq!(reread.total_volume, None);
    }

    #[test]
    fn exercise_status_change_is_guarded() {
        let Some(mut conn) = test_support::db() else { return };
        let detail = started_session(&mut conn);
        let exercise = detail.exercises[0].session.clone();

        let started = set_exercise_status(&mut conn, &exercise, ExerciseSessionStatus::InProgress).unwrap();
        assert!(started.started_at.is_some());

        let err = set_exercise_status(&mut conn, &exercise, ExerciseSessionStatus::Skipped).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidExerciseTransition);
    }
}
