use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use nutrifit_shared::types::auth::UserProfile;

use crate::schema::{
    addresses, appointments, customer_feedbacks, customer_professional_bonds, customer_routines,
    exercise_sessions, exercise_templates, exercises, favorite_professionals, professional_credentials,
    professional_details, professional_feedbacks, routines, set_sessions, users, workout_sessions,
    workout_templates,
};
use crate::status::{
    AppointmentStatus, AppointmentType, BondStatus, Difficulty, ExerciseSessionStatus, RoutineGoal, Sex,
    WorkoutSessionStatus,
};

// --- Address ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Address {
    pub id: Uuid,
    pub line: String,
    pub number: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip)]
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Addresses arrive inline in user and appointment payloads.
#[derive(Debug, Insertable, AsChangeset, Deserialize, Validate, Clone)]
#[diesel(table_name = addresses)]
pub struct NewAddress {
    #[validate(length(min = 1, max = 200))]
    pub line: String,
    #[validate(length(min = 1, max = 20))]
    pub number: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// --- User ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub profile: UserProfile,
    pub address_id: Option<Uuid>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile: UserProfile,
    pub address_id: Option<Uuid>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub address_id: Option<Uuid>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address_id.is_none()
            && self.date_of_birth.is_none()
            && self.sex.is_none()
            && self.phone.is_none()
    }
}

// --- Professional credential / details ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = professional_credentials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfessionalCredential {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub credential_type: String,
    pub credential_number: String,
    pub biography: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = professional_credentials)]
pub struct NewProfessionalCredential {
    pub professional_id: Uuid,
    pub credential_type: String,
    pub credential_number: String,
    pub biography: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = professional_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfessionalDetails {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub experience_years: Option<i32>,
    pub specialties: Vec<String>,
    pub online_service: bool,
    pub presential_service: bool,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = professional_details)]
pub struct NewProfessionalDetails {
    pub professional_id: Uuid,
    pub experience_years: Option<i32>,
    pub specialties: Vec<String>,
    pub online_service: bool,
    pub presential_service: bool,
}

// --- Bond ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = customer_professional_bonds)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Bond {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub professional_id: Uuid,
    pub sender_id: Uuid,
    pub status: BondStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bond {
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.customer_id == user_id || self.professional_id == user_id
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customer_professional_bonds)]
pub struct NewBond {
    pub customer_id: Uuid,
    pub professional_id: Uuid,
    pub sender_id: Uuid,
    pub status: BondStatus,
}

// --- Appointment ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Appointment {
    pub id: Uuid,
    pub bond_id: Uuid,
    pub requested_by: Uuid,
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub address_id: Option<Uuid>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = appointments)]
pub struct NewAppointment {
    pub bond_id: Uuid,
    pub requested_by: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub appointment_type: AppointmentType,
    pub address_id: Option<Uuid>,
    pub status: AppointmentStatus,
}

// --- Exercise ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = exercises)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub instructions: Option<String>,
    pub category: String,
    pub primary_muscles: Vec<String>,
    pub secondary_muscles: Vec<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub created_by_user_id: Option<Uuid>,
    pub is_published: bool,
    #[serde(skip)]
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = exercises)]
pub struct NewExercise {
    pub name: String,
    pub instructions: Option<String>,
    pub category: String,
    pub primary_muscles: Vec<String>,
    pub secondary_muscles: Vec<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub created_by_user_id: Option<Uuid>,
    pub is_published: bool,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = exercises)]
pub struct UpdateExercise {
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub category: Option<String>,
    pub primary_muscles: Option<Vec<String>>,
    pub secondary_muscles: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

impl UpdateExercise {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.instructions.is_none()
            && self.category.is_none()
            && self.primary_muscles.is_none()
            && self.secondary_muscles.is_none()
            && self.image_url.is_none()
            && self.video_url.is_none()
    }
}

// --- Routine ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = routines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Routine {
    pub id: Uuid,
    pub personal_id: Uuid,
    pub title: String,
    pub goal: RoutineGoal,
    pub difficulty: Difficulty,
    pub weeks: Option<i32>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = routines)]
pub struct NewRoutine {
    pub personal_id: Uuid,
    pub title: String,
    pub goal: RoutineGoal,
    pub difficulty: Difficulty,
    pub weeks: Option<i32>,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = routines)]
pub struct UpdateRoutine {
    pub title: Option<String>,
    pub goal: Option<RoutineGoal>,
    pub difficulty: Option<Difficulty>,
    pub weeks: Option<i32>,
}

impl UpdateRoutine {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.goal.is_none()
            && self.difficulty.is_none()
            && self.weeks.is_none()
    }
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = customer_routines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRoutine {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub customer_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customer_routines)]
pub struct NewCustomerRoutine {
    pub routine_id: Uuid,
    pub customer_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Workout / exercise templates ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = workout_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workout_templates)]
pub struct NewWorkoutTemplate {
    pub routine_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = workout_templates)]
pub struct UpdateWorkoutTemplate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
}

impl UpdateWorkoutTemplate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.position.is_none()
    }
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = exercise_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExerciseTemplate {
    pub id: Uuid,
    pub workout_template_id: Uuid,
    pub exercise_id: Uuid,
    pub position: i32,
    pub target_sets: i32,
    pub target_reps: i32,
    pub target_load: Option<f64>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = exercise_templates)]
pub struct NewExerciseTemplate {
    pub workout_template_id: Uuid,
    pub exercise_id: Uuid,
    pub position: i32,
    pub target_sets: i32,
    pub target_reps: i32,
    pub target_load: Option<f64>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = exercise_templates)]
pub struct UpdateExerciseTemplate {
    pub exercise_id: Option<Uuid>,
    pub target_sets: Option<i32>,
    pub target_reps: Option<i32>,
    pub target_load: Option<f64>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

impl UpdateExerciseTemplate {
    pub fn is_empty(&self) -> bool {
        self.exercise_id.is_none()
            && self.target_sets.is_none()
            && self.target_reps.is_none()
            && self.target_load.is_none()
            && self.rest_seconds.is_none()
            && self.notes.is_none()
    }
}

// --- Workout / exercise / set sessions ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = workout_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkoutSession {
    pub id: Uuid,
    pub workout_template_id: Uuid,
    pub customer_id: Uuid,
    pub status: WorkoutSessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_volume: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workout_sessions)]
pub struct NewWorkoutSession {
    pub workout_template_id: Uuid,
    pub customer_id: Uuid,
    pub status: WorkoutSessionStatus,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = exercise_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExerciseSession {
    pub id: Uuid,
    pub workout_session_id: Uuid,
    pub exercise_template_id: Option<Uuid>,
    pub exercise_id: Uuid,
    pub position: i32,
    pub status: ExerciseSessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = exercise_sessions)]
pub struct NewExerciseSession {
    pub workout_session_id: Uuid,
    pub exercise_template_id: Option<Uuid>,
    pub exercise_id: Uuid,
    pub position: i32,
    pub status: ExerciseSessionStatus,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = set_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SetSession {
    pub id: Uuid,
    pub exercise_session_id: Uuid,
    pub set_number: i32,
    pub load: Option<f64>,
    pub reps: Option<i32>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = set_sessions)]
pub struct NewSetSession {
    pub exercise_session_id: Uuid,
    pub set_number: i32,
    pub load: Option<f64>,
    pub reps: Option<i32>,
}

// --- Feedback ---

/// Written by a customer about a professional.
#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = professional_feedbacks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfessionalFeedback {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub professional_id: Uuid,
    pub rating: i16,
    pub testimony: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = professional_feedbacks)]
pub struct NewProfessionalFeedback {
    pub customer_id: Uuid,
    pub professional_id: Uuid,
    pub rating: i16,
    pub testimony: Option<String>,
}

/// Written by a professional about a customer.
#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = customer_feedbacks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerFeedback {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub testimony: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customer_feedbacks)]
pub struct NewCustomerFeedback {
    pub professional_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub testimony: Option<String>,
}

// --- Favorite ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = favorite_professionals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FavoriteProfessional {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub professional_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorite_professionals)]
pub struct NewFavoriteProfessional {
    pub customer_id: Uuid,
    pub professional_id: Uuid,
}
