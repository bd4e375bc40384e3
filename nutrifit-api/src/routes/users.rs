use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};
use nutrifit_shared::types::auth::{AuthUser, UserProfile};
use nutrifit_shared::types::pagination::{default_page, default_per_page, Paginated, PaginationParams};
use nutrifit_shared::types::{ApiResponse, Removed};

use crate::models::{
    NewAddress, NewProfessionalCredential, NewProfessionalDetails, NewUser, ProfessionalCredential,
    ProfessionalDetails, UpdateUser, User,
};
use crate::routes::auth::LoginResponse;
use crate::schema::{addresses, professional_credentials, professional_details, users};
use crate::services::user_service::{self, UserDetail};
use crate::services::{auth_service, token_service};
use crate::status::Sex;
use crate::AppState;

// --- Request types ---

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 120, message = "name must be 2-120 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    pub profile: UserProfile,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate]
    pub address: Option<NewAddress>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 120, message = "name must be 2-120 characters"))]
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate]
    pub address: Option<NewAddress>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialRequest {
    #[validate(length(min = 1, max = 20))]
    pub credential_type: String,
    #[validate(length(min = 1, max = 50))]
    pub credential_number: String,
    #[validate(length(max = 2000))]
    pub biography: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DetailsRequest {
    #[validate(range(min = 0, max = 80))]
    pub experience_years: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub online_service: bool,
    #[serde(default)]
    pub presential_service: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProfessionalFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub profile: Option<UserProfile>,
    pub search: Option<String>,
}

impl ProfessionalFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }
}

fn professional_query(params: &ProfessionalFilterParams) -> users::BoxedQuery<'static, Pg> {
    let mut query = users::table
        .filter(users::status.eq(true))
        .filter(users::profile.eq_any(vec![UserProfile::Personal, UserProfile::Nutritionist]))
        .into_boxed();

    if let Some(profile) = params.profile {
        query = query.filter(users::profile.eq(profile));
    }
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(users::name.ilike(db::contains_pattern(search)));
    }
    query
}

fn require_self(user: &AuthUser, id: Uuid) -> AppResult<()> {
    if user.id != id {
        return Err(AppError::forbidden("you can only change your own account"));
    }
    Ok(())
}

// --- POST /user ---

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()?;
    auth_service::validate_password(&req.password)?;

    let email = auth_service::normalize_email(&req.email);
    let password_hash = auth_service::hash_password(&req.password)?;
    let mut conn = db::conn(&state.db)?;

    let exists: i64 = users::table
        .filter(users::email.eq(&email))
        .count()
        .get_result(&mut conn)?;
    if exists > 0 {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
    }

    let user = conn.transaction::<_, AppError, _>(|conn| {
        let address_id = match &req.address {
            Some(address) => Some(
                diesel::insert_into(addresses::table)
                    .values(address)
                    .returning(addresses::id)
                    .get_result::<Uuid>(conn)?,
            ),
            None => None,
        };

        let new_user = NewUser {
            name: req.name.trim().to_string(),
            email,
            password_hash,
            profile: req.profile,
            address_id,
            date_of_birth: req.date_of_birth,
            sex: req.sex,
            phone: req.phone.clone(),
        };

        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(conn)?;
        Ok(user)
    })?;

    let token = token_service::create_access_token(&user, &state.jwt, state.config.jwt_access_ttl)?;

    tracing::info!(user_id = %user.id, profile = %user.profile, "user registered");

    Ok(Json(ApiResponse::ok(LoginResponse { token, user })))
}

// --- GET /user ---

pub async fn list_professionals(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProfessionalFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<User>>>> {
    let pagination = params.pagination();
    let mut conn = db::conn(&state.db)?;

    let total: i64 = professional_query(&params).count().get_result(&mut conn)?;
    let items = professional_query(&params)
        .order(users::name.asc())
        .offset(pagination.offset())
        .limit(pagination.limit() as i64)
        .select(User::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &pagination))))
}

// --- GET /user/me ---

pub async fn get_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let mut conn = db::conn(&state.db)?;
    let me = user_service::find_active_user(&mut conn, user.id)?;
    Ok(Json(ApiResponse::ok(user_service::load_detail(&mut conn, me)?)))
}

// --- GET /user/:id ---

pub async fn get_user(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let mut conn = db::conn(&state.db)?;
    let found = user_service::find_active_user(&mut conn, id)?;
    Ok(Json(ApiResponse::ok(user_service::load_detail(&mut conn, found)?)))
}

// --- PUT /user/:id ---

pub async fn update_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    require_self(&user, id)?;
    req.validate()?;

    let mut conn = db::conn(&state.db)?;
    let current = user_service::find_active_user(&mut conn, id)?;

    let updated = conn.transaction::<_, AppError, _>(|conn| {
        let mut changes = UpdateUser {
            name: req.name.as_deref().map(|n| n.trim().to_string()),
            address_id: None,
            date_of_birth: req.date_of_birth,
            sex: req.sex,
            phone: req.phone.clone(),
        };

        if let Some(address) = &req.address {
            match current.address_id {
                Some(address_id) => {
                    diesel::update(addresses::table.find(address_id))
                        .set(address)
                        .execute(conn)?;
                }
                None => {
                    let address_id = diesel::insert_into(addresses::table)
                        .values(address)
                        .returning(addresses::id)
                        .get_result::<Uuid>(conn)?;
                    changes.address_id = Some(address_id);
                }
            }
        }

        if changes.is_empty() {
            return Ok(current);
        }
        let user = diesel::update(users::table.find(id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(conn)?;
        Ok(user)
    })?;

    tracing::info!(user_id = %id, "user updated");

    Ok(Json(ApiResponse::ok(user_service::load_detail(&mut conn, updated)?)))
}

// --- DELETE /user/:id ---

pub async fn delete_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Removed>>> {
    require_self(&user, id)?;

    let mut conn = db::conn(&state.db)?;
    user_service::find_active_user(&mut conn, id)?;

    diesel::update(users::table.find(id))
        .set(users::status.eq(false))
        .execute(&mut conn)?;

    tracing::info!(user_id = %id, "user deactivated");

    Ok(Json(ApiResponse::ok_with_message(Removed::new(id), "account deactivated")))
}

// --- PUT /user/:id/credential ---

pub async fn upsert_credential(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CredentialRequest>,
) -> AppResult<Json<ApiResponse<ProfessionalCredential>>> {
    require_self(&user, id)?;
    if !user.is_professional() {
        return Err(AppError::new(ErrorCode::ProfessionalRequired, "only professionals have credentials"));
    }
    req.validate()?;

    let mut conn = db::conn(&state.db)?;

    let record = NewProfessionalCredential {
        professional_id: id,
        credential_type: req.credential_type,
        credential_number: req.credential_number,
        biography: req.biography,
    };

    let credential = diesel::insert_into(professional_credentials::table)
        .values(&record)
        .on_conflict(professional_credentials::professional_id)
        .do_update()
        .set((&record, professional_credentials::status.eq(true)))
        .returning(ProfessionalCredential::as_returning())
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(credential)))
}

// --- PUT /user/:id/details ---

pub async fn upsert_details(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<DetailsRequest>,
) -> AppResult<Json<ApiResponse<ProfessionalDetails>>> {
    require_self(&user, id)?;
    if !user.is_professional() {
        return Err(AppError::new(ErrorCode::ProfessionalRequired, "only professionals have service details"));
    }
    req.validate()?;

    let mut conn = db::conn(&state.db)?;

    let record = NewProfessionalDetails {
        professional_id: id,
        experience_years: req.experience_years,
        specialties: req.specialties.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        online_service: req.online_service,
        presential_service: req.presential_service,
    };

    let details = diesel::insert_into(professional_details::table)
        .values(&record)
        .on_conflict(professional_details::professional_id)
        .do_update()
        .set((&record, professional_details::status.eq(true)))
        .returning(ProfessionalDetails::as_returning())
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(details)))
}

