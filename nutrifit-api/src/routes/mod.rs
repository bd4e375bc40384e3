pub mod appointments;
pub mod auth;
pub mod bonds;
pub mod exercises;
pub mod favorites;
pub mod feedback;
pub mod health;
pub mod routines;
pub mod users;
pub mod workout_templates;
pub mod workouts;
