use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::types::auth::AuthUser;
use nutrifit_shared::types::ApiResponse;

use crate::models::{CustomerFeedback, NewCustomerFeedback, NewProfessionalFeedback, ProfessionalFeedback};
use crate::schema::{customer_feedbacks, professional_feedbacks};
use crate::services::{bond_service, user_service};
use crate::status::BondStatus;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub testimony: Option<String>,
}

/// Feedback from either direction, seen from the author/subject angle.
#[derive(Debug, Serialize)]
pub struct FeedbackView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub subject_id: Uuid,
    pub rating: i16,
    pub testimony: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfessionalFeedback> for FeedbackView {
    fn from(f: ProfessionalFeedback) -> Self {
        Self {
            id: f.id,
            author_id: f.customer_id,
            subject_id: f.professional_id,
            rating: f.rating,
            testimony: f.testimony,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

impl From<CustomerFeedback> for FeedbackView {
    fn from(f: CustomerFeedback) -> Self {
        Self {
            id: f.id,
            author_id: f.professional_id,
            subject_id: f.customer_id,
            rating: f.rating,
            testimony: f.testimony,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

// --- GET /user/:id/feedbacks ---

pub async fn list_received(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<FeedbackView>>>> {
    let mut conn = db::conn(&state.db)?;
    let subject = user_service::find_active_user(&mut conn, id)?;

    let items: Vec<FeedbackView> = if subject.profile.is_professional() {
        professional_feedbacks::table
            .filter(professional_feedbacks::professional_id.eq(id))
            .filter(professional_feedbacks::status.eq(true))
            .order(professional_feedbacks::updated_at.desc())
            .select(ProfessionalFeedback::as_select())
            .load::<ProfessionalFeedback>(&mut conn)?
            .into_iter()
            .map(FeedbackView::from)
            .collect()
    } else {
        customer_feedbacks::table
            .filter(customer_feedbacks::customer_id.eq(id))
            .filter(customer_feedbacks::status.eq(true))
            .order(customer_feedbacks::updated_at.desc())
            .select(CustomerFeedback::as_select())
            .load::<CustomerFeedback>(&mut conn)?
            .into_iter()
            .map(FeedbackView::from)
            .collect()
    };

    Ok(Json(ApiResponse::ok(items)))
}

// --- POST /user/:id/feedbacks ---

pub async fn give_feedback(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> AppResult<Json<ApiResponse<FeedbackView>>> {
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    user_service::require_active_caller(&mut conn, user.id)?;
    let subject = user_service::find_active_user(&mut conn, id)?;
    let parties = bond_service::resolve_parties((user.id, user.profile), (subject.id, subject.profile))?;

    // Only people who actually worked together may rate each other.
    let bond = bond_service::find_bond_between(
        &mut conn,
        parties,
        &[BondStatus::Accepted, BondStatus::Cancelled],
    )?;
    if bond.is_none() {
        return Err(AppError::new(
            ErrorCode::FeedbackNotAllowed,
            "feedback requires an accepted or finished bond",
        ));
    }

    let view: FeedbackView = if user.is_customer() {
        let record = NewProfessionalFeedback {
            customer_id: parties.customer_id,
            professional_id: parties.professional_id,
            rating: req.rating,
            testimony: req.testimony,
        };
        diesel::insert_into(professional_feedbacks::table)
            .values(&record)
            .on_conflict((professional_feedbacks::customer_id, professional_feedbacks::professional_id))
            .do_update()
            .set((
                professional_feedbacks::rating.eq(record.rating),
                professional_feedbacks::testimony.eq(&record.testimony),
                professional_feedbacks::status.eq(true),
            ))
            .returning(ProfessionalFeedback::as_returning())
            .get_result::<ProfessionalFeedback>(&mut conn)?
            .into()
    } else {
        let record = NewCustomerFeedback {
            professional_id: parties.professional_id,
            customer_id: parties.customer_id,
            rating: req.rating,
            testimony: req.testimony,
        };
        diesel::insert_into(customer_feedbacks::table)
            .values(&record)
            .on_conflict((customer_feedbacks::customer_id, customer_feedbacks::professional_id))
            .do_update()
            .set((
                customer_feedbacks::rating.eq(record.rating),
                customer_feedbacks::testimony.eq(&record.testimony),
                customer_feedbacks::status.eq(true),
            ))
            .returning(CustomerFeedback::as_returning())
            .get_result::<CustomerFeedback>(&mut conn)?
            .into()
    };

    tracing::info!(
        feedback_id = %view.id,
        author_id = %view.author_id,
        subject_id = %view.subject_id,
        rating = view.rating,
        "feedback recorded"
    );

    Ok(Json(ApiResponse::ok(view)))
}
