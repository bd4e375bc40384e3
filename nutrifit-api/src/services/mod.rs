pub mod auth_service;
pub mod bond_service;
pub mod exercise_service;
pub mod routine_service;
pub mod template_service;
pub mod token_service;
pub mod user_service;
pub mod workout_service;
