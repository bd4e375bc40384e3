//! Database fixtures for tests that need PostgreSQL.
//!
//! Tests call [`db`] and return early when it yields `None`, so the suite
//! still passes on machines without `DATABASE_URL`. Every connection runs
//! inside a test transaction that is rolled back when it drops.

use std::sync::Once;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use nutrifit_shared::types::auth::UserProfile;

use crate::models::{
    Bond, Exercise, ExerciseTemplate, NewBond, NewExercise, NewExerciseTemplate, NewRoutine, NewUser,
    NewWorkoutTemplate, Routine, User, WorkoutTemplate,
};
use crate::schema::{customer_professional_bonds, exercise_templates, exercises, routines, users, workout_templates};
use crate::status::{BondStatus, Difficulty, RoutineGoal};

static MIGRATE: Once = Once::new();

pub fn db() -> Option<PgConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;

    MIGRATE.call_once(|| {
        let mut conn = PgConnection::establish(&url).expect("connect to DATABASE_URL");
        crate::run_migrations(&mut conn).expect("apply migrations");
    });

    let mut conn = PgConnection::establish(&url).expect("connect to DATABASE_URL");
    conn.begin_test_transaction().expect("open test transaction");
    Some(conn)
}

pub fn user(conn: &mut PgConnection, profile: UserProfile) -> User {
    let id = Uuid::new_v4();
    diesel::insert_into(users::table)
        .values(&NewUser {
            name: format!("user {}", &id.simple().to_string()[..8]),
            email: format!("{id}@nutrifit.test"),
            password_hash: "not-a-real-hash".to_string(),
            profile,
            address_id: None,
            date_of_birth: None,
            sex: None,
            phone: None,
        })
        .returning(User::as_returning())
        .get_result(conn)
        .expect("insert user")
}

pub fn bond(conn: &mut PgConnection, customer: &User, professional: &User, status: BondStatus) -> Bond {
    diesel::insert_into(customer_professional_bonds::table)
        .values(&NewBond {
            customer_id: customer.id,
            professional_id: professional.id,
            sender_id: customer.id,
            status,
        })
        .returning(Bond::as_returning())
        .get_result(conn)
        .expect("insert bond")
}

pub fn routine(conn: &mut PgConnection, personal: &User, weeks: Option<i32>) -> Routine {
    diesel::insert_into(routines::table)
        .values(&NewRoutine {
            personal_id: personal.id,
            title: "Push pull legs".to_string(),
            goal: RoutineGoal::Hypertrophy,
            difficulty: Difficulty::Intermediate,
            weeks,
        })
        .returning(Routine::as_returning())
        .get_result(conn)
        .expect("insert routine")
}

pub fn exercise(conn: &mut PgConnection, name: &str) -> Exercise {
    diesel::insert_into(exercises::table)
        .values(&NewExercise {
            name: name.to_string(),
            instructions: None,
            category: "strength".to_string(),
            primary_muscles: vec!["chest".to_string()],
            secondary_muscles: Vec::new(),
            image_url: None,
            video_url: None,
            created_by_user_id: None,
            is_published: true,
        })
        .returning(Exercise::as_returning())
        .get_result(conn)
        .expect("insert exercise")
}

/// A template on `routine` with one exercise template per `(exercise, sets, reps, load)`.
pub fn template(
    conn: &mut PgConnection,
    routine: &Routine,
    exercises: &[(&Exercise, i32, i32, Option<f64>)],
) -> (WorkoutTemplate, Vec<ExerciseTemplate>) {
    let template = diesel::insert_into(workout_templates::table)
        .values(&NewWorkoutTemplate {
            routine_id: routine.id,
            title: "Day A".to_string(),
            description: None,
            position: 1,
        })
        .returning(WorkoutTemplate::as_returning())
        .get_result(conn)
        .expect("insert workout template");

    let rows: Vec<NewExerciseTemplate> = exercises
        .iter()
        .enumerate()
        .map(|(i, (exercise, sets, reps, load))| NewExerciseTemplate {
            workout_template_id: template.id,
            exercise_id: exercise.id,
            position: i as i32 + 1,
            target_sets: *sets,
            target_reps: *reps,
            target_load: *load,
            rest_seconds: Some(90),
            notes: None,
        })
        .collect();

    let items = diesel::insert_into(exercise_templates::table)
        .values(&rows)
        .returning(ExerciseTemplate::as_returning())
        .get_results(conn)
        .expect("insert exercise templates");

    (template, items)
}
