use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: User and authentication errors
/// - E2xxx: Bond errors
/// - E3xxx: Appointment errors
/// - E4xxx: Routine and workout template errors
/// - E5xxx: Workout session errors
/// - E6xxx: Exercise catalog errors
/// - E7xxx: Feedback and favorite errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    ServiceUnavailable,
    BadRequest,
    Conflict,

    // Users / auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenExpired,
    TokenInvalid,
    UserNotFound,
    ProfessionalRequired,
    CustomerRequired,
    PasswordTooWeak,

    // Bonds (E2xxx)
    BondNotFound,
    BondAlreadyExists,
    InvalidBondTransition,
    NotBondParty,
    BondNotAccepted,
    InvalidBondParties,

    // Appointments (E3xxx)
    AppointmentNotFound,
    InvalidAppointmentTransition,
    AddressRequired,
    AddressNotAllowed,

    // Routines / templates (E4xxx)
    RoutineNotFound,
    NotRoutineOwner,
    CustomerRoutineNotFound,
    WorkoutTemplateNotFound,
    ExerciseTemplateNotFound,
    InvalidReorder,

    // Workout sessions (E5xxx)
    WorkoutSessionNotFound,
    InvalidWorkoutTransition,
    ExerciseSessionNotFound,
    InvalidExerciseTransition,
    SetSessionNotFound,
    WorkoutNotInProgress,

    // Exercises (E6xxx)
    ExerciseNotFound,
    NotExerciseOwner,

    // Feedback / favorites (E7xxx)
    FeedbackNotAllowed,
    FavoriteAlreadyExists,
    FavoriteNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::ServiceUnavailable => "E0006",
            Self::BadRequest => "E0007",
            Self::Conflict => "E0008",

            // Users / auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenExpired => "E1003",
            Self::TokenInvalid => "E1004",
            Self::UserNotFound => "E1005",
            Self::ProfessionalRequired => "E1006",
            Self::CustomerRequired => "E1007",
            Self::PasswordTooWeak => "E1008",

            // Bonds
            Self::BondNotFound => "E2001",
            Self::BondAlreadyExists => "E2002",
            Self::InvalidBondTransition => "E2003",
            Self::NotBondParty => "E2004",
            Self::BondNotAccepted => "E2005",
            Self::InvalidBondParties => "E2006",

            // Appointments
            Self::AppointmentNotFound => "E3001",
            Self::InvalidAppointmentTransition => "E3002",
            Self::AddressRequired => "E3003",
            Self::AddressNotAllowed => "E3004",

            // Routines / templates
            Self::RoutineNotFound => "E4001",
            Self::NotRoutineOwner => "E4002",
            Self::CustomerRoutineNotFound => "E4003",
            Self::WorkoutTemplateNotFound => "E4004",
            Self::ExerciseTemplateNotFound => "E4005",
            Self::InvalidReorder => "E4006",

            // Workout sessions
            Self::WorkoutSessionNotFound => "E5001",
            Self::InvalidWorkoutTransition => "E5002",
            Self::ExerciseSessionNotFound => "E5003",
            Self::InvalidExerciseTransition => "E5004",
            Self::SetSessionNotFound => "E5005",
            Self::WorkoutNotInProgress => "E5006",

            // Exercises
            Self::ExerciseNotFound => "E6001",
            Self::NotExerciseOwner => "E6002",

            // Feedback / favorites
            Self::FeedbackNotAllowed => "E7001",
            Self::FavoriteAlreadyExists => "E7002",
            Self::FavoriteNotFound => "E7003",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak
            | Self::AddressRequired | Self::AddressNotAllowed | Self::InvalidReorder
            | Self::InvalidBondParties => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound | Self::BondNotFound
            | Self::AppointmentNotFound | Self::RoutineNotFound | Self::CustomerRoutineNotFound
            | Self::WorkoutTemplateNotFound | Self::ExerciseTemplateNotFound
            | Self::WorkoutSessionNotFound | Self::ExerciseSessionNotFound
            | Self::SetSessionNotFound | Self::ExerciseNotFound
            | Self::FavoriteNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::ProfessionalRequired | Self::CustomerRequired
            | Self::NotBondParty | Self::NotRoutineOwner | Self::NotExerciseOwner
            | Self::FeedbackNotAllowed => StatusCode::FORBIDDEN,
            Self::Conflict | Self::EmailAlreadyExists | Self::BondAlreadyExists
            | Self::InvalidBondTransition | Self::BondNotAccepted
            | Self::InvalidAppointmentTransition | Self::InvalidWorkoutTransition
            | Self::InvalidExerciseTransition | Self::WorkoutNotInProgress
            | Self::FavoriteAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code this error will be reported with.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Known { code, .. } => *code,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            Self::Database(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => ErrorCode::Conflict,
            Self::Database(_) => ErrorCode::InternalError,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(errors.field_errors()).unwrap_or(serde_json::Value::Null);
        Self::with_details(ErrorCode::ValidationError, "request validation failed", details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => (
                        StatusCode::CONFLICT,
                        ApiErrorResponse::new("E0008", "resource already exists"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_errors_map_to_conflict() {
        for code in [
            ErrorCode::InvalidBondTransition,
            ErrorCode::InvalidAppointmentTransition,
            ErrorCode::InvalidWorkoutTransition,
            ErrorCode::InvalidExerciseTransition,
        ] {
            assert_eq!(code.status_code(), StatusCode::CONFLICT, "{code:?}");
        }
    }

    #[test]
    fn codes_follow_area_ranges() {
        assert_eq!(ErrorCode::ValidationError.code(), "E0002");
        assert!(ErrorCode::UserNotFound.code().starts_with("E1"));
        assert!(ErrorCode::BondNotFound.code().starts_with("E2"));
        assert!(ErrorCode::AppointmentNotFound.code().starts_with("E3"));
        assert!(ErrorCode::RoutineNotFound.code().starts_with("E4"));
        assert!(ErrorCode::WorkoutSessionNotFound.code().starts_with("E5"));
        assert!(ErrorCode::ExerciseNotFound.code().starts_with("E6"));
        assert!(ErrorCode::FavoriteNotFound.code().starts_with("E7"));
    }

    #[test]
    fn known_error_renders_status_from_code() {
        let response = AppError::new(ErrorCode::NotBondParty, "not yours").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn diesel_not_found_renders_404() {
        let err = AppError::from(diesel::result::Error::NotFound);
        assert_eq!(err.error_code(), ErrorCode::NotFound);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("rating", validator::ValidationError::new("range"));
        let err = AppError::from(errors);
        match err {
            AppError::Known { code, details, .. } => {
                assert_eq!(code, ErrorCode::ValidationError);
                assert!(details.unwrap().get("rating").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
