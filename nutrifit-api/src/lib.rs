use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{middleware, Router};
use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use nutrifit_shared::clients::db::DbPool;
use nutrifit_shared::middleware::metrics_middleware;
use nutrifit_shared::types::auth::{AuthState, JwtSecret};

pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod status;

#[cfg(test)]
pub(crate) mod test_support;

use config::AppConfig;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub jwt: JwtSecret,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        let jwt = JwtSecret::new(config.jwt_secret.as_str());
        Self { db, config, jwt }
    }
}

impl AuthState for AppState {
    fn jwt_secret(&self) -> JwtSecret {
        self.jwt.clone()
    }
}

/// Applies every embedded migration that has not run yet.
pub fn run_migrations(conn: &mut PgConnection) -> anyhow::Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
    tracing::info!(count = applied.len(), "database migrations applied");
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    use routes::{
        appointments, auth, bonds, exercises, favorites, feedback, health, routines, users,
        workout_templates, workouts,
    };

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        // Authentication
        .route("/authentication/login", post(auth::login))
        .route("/authentication/validateSession", get(auth::validate_session))
        // Users
        .route("/user", post(users::register).get(users::list_professionals))
        .route("/user/me", get(users::get_me))
        .route("/user/favorites", get(favorites::list_favorites))
        .route(
            "/user/favorites/:professional_id",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route(
            "/user/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/user/:id/credential", put(users::upsert_credential))
        .route("/user/:id/details", put(users::upsert_details))
        .route(
            "/user/:id/feedbacks",
            get(feedback::list_received).post(feedback::give_feedback),
        )
        // Bonds
        .route("/bond", post(bonds::create_bond).get(bonds::list_as_professional))
        .route("/bond/sent", get(bonds::list_sent))
        .route("/bond/as-customer", get(bonds::list_as_customer))
        .route(
            "/bond/:id",
            get(bonds::get_bond).put(bonds::update_bond).delete(bonds::withdraw_bond),
        )
        // Appointments
        .route("/appointment", post(appointments::create_appointment))
        .route(
            "/appointment/:id",
            get(appointments::get_appointment).put(appointments::update_appointment),
        )
        .route("/appointment/bond/:bond_id", get(appointments::list_by_bond))
        .route("/appointment/customer/all", get(appointments::list_as_customer))
        .route("/appointment/professional/all", get(appointments::list_as_professional))
        // Routines
        .route("/routine", post(routines::create_routine).get(routines::list_authored))
        .route("/routine/my-routines", get(routines::list_assigned_to_me))
        .route("/routine/near-expiry", get(routines::list_near_expiry))
        .route("/routine/assign", post(routines::assign_routine))
        .route("/routine/assign/:id", axum::routing::delete(routines::unassign_routine))
        .route(
            "/routine/:id",
            get(routines::get_routine)
                .put(routines::update_routine)
                .delete(routines::delete_routine),
        )
        // Workout templates
        .route("/workoutTemplate", post(workout_templates::create_template))
        .route(
            "/workoutTemplate/routine/:routine_id",
            get(workout_templates::list_by_routine),
        )
        .route(
            "/workoutTemplate/exercises/:id",
            put(workout_templates::update_exercise_template)
                .delete(workout_templates::remove_exercise_template),
        )
        .route(
            "/workoutTemplate/:id",
            get(workout_templates::get_template)
                .put(workout_templates::update_template)
                .delete(workout_templates::delete_template),
        )
        .route("/workoutTemplate/:id/reorder", put(workout_templates::reorder_exercises))
        .route("/workoutTemplate/:id/exercises", post(workout_templates::add_exercise_template))
        // Workout sessions
        .route("/workout", post(workouts::start_workout).get(workouts::list_my_workouts))
        .route("/workout/routine/:routine_id", get(workouts::list_by_routine))
        .route("/workout/:id", get(workouts::get_workout).put(workouts::finish_workout))
        .route("/workout/:id/sets", put(workouts::record_sets))
        .route(
            "/workout/:id/exercises/:exercise_session_id",
            put(workouts::update_exercise_session),
        )
        // Exercise catalog
        .route("/exercise", get(exercises::list_exercises).post(exercises::create_exercise))
        .route(
            "/exercise/:id",
            get(exercises::get_exercise)
                .put(exercises::update_exercise)
                .delete(exercises::delete_exercise),
        )
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use nutrifit_shared::clients::db::create_lazy_pool;
    use nutrifit_shared::middleware::encode_token;
    use nutrifit_shared::types::auth::{Claims, UserProfile};
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    // Points at nothing; handlers under test reject the request before asking for a connection.
    fn app() -> (Router, JwtSecret) {
        let pool = create_lazy_pool("postgres://invalid@127.0.0.1:1/none", 1, Duration::from_millis(200));
        let state = Arc::new(AppState::new(pool, AppConfig::default()));
        let secret = state.jwt.clone();
        (router(state), secret)
    }

    fn token(secret: &JwtSecret, profile: UserProfile) -> String {
        encode_token(&Claims::new(Uuid::new_v4(), profile, 3600), secret).unwrap()
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _) = app();
        let (status, body) = send(app, request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let (app, _) = app();
        let (status, body) = send(app, request(Method::GET, "/bond", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "E0004");
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let (app, _) = app();
        let foreign = token(&JwtSecret::new("another-secret"), UserProfile::Personal);
        let (status, body) = send(app, request(Method::GET, "/user/me", Some(&foreign), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "E1004");
    }

    #[tokio::test]
    async fn students_cannot_author_routines() {
        let (app, secret) = app();
        let student = token(&secret, UserProfile::Student);
        let body = serde_json::json!({ "title": "Push day", "goal": "H", "difficulty": "B" });
        let (status, body) = send(app, request(Method::POST, "/routine", Some(&student), Some(body))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "E1006");
    }

    #[tokio::test]
    async fn professionals_cannot_start_workouts() {
        let (app, secret) = app();
        let trainer = token(&secret, UserProfile::Personal);
        let body = serde_json::json!({ "workout_template_id": Uuid::new_v4() });
        let (status, body) = send(app, request(Method::POST, "/workout", Some(&trainer), Some(body))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "E1007");
    }

    #[tokio::test]
    async fn feedback_rating_out_of_range_is_rejected() {
        let (app, secret) = app();
        let student = token(&secret, UserProfile::Student);
        let uri = format!("/user/{}/feedbacks", Uuid::new_v4());
        let body = serde_json::json!({ "rating": 9 });
        let (status, body) = send(app, request(Method::POST, &uri, Some(&student), Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn empty_reorder_is_rejected() {
        let (app, secret) = app();
        let trainer = token(&secret, UserProfile::Personal);
        let uri = format!("/workoutTemplate/{}/reorder", Uuid::new_v4());
        let body = serde_json::json!({ "exercise_template_ids": [] });
        let (status, _) = send(app, request(Method::PUT, &uri, Some(&trainer), Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn presential_appointment_needs_an_address() {
        let (app, secret) = app();
        let student = token(&secret, UserProfile::Student);
        let body = serde_json::json!({
            "bond_id": Uuid::new_v4(),
            "scheduled_at": "2024-06-01T10:00:00Z",
            "type": "P",
        });
        let (status, body) = send(app, request(Method::POST, "/appointment", Some(&student), Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "E3003");
    }

    #[tokio::test]
    async fn near_expiry_window_must_be_positive() {
        let (app, secret) = app();
        let student = token(&secret, UserProfile::Student);
        let (status, _) =
            send(app, request(Method::GET, "/routine/near-expiry?days=0", Some(&student), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recording_no_sets_is_rejected() {
        let (app, secret) = app();
        let student = token(&secret, UserProfile::Student);
        let uri = format!("/workout/{}/sets", Uuid::new_v4());
        let body = serde_json::json!({ "sets": [] });
        let (status, body) = send(app, request(Method::PUT, &uri, Some(&student), Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "E0007");
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (app, _) = app();
        let (status, _) = send(app, request(Method::GET, "/nowhere", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
