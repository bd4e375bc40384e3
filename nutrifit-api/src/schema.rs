// Diesel table definitions mirroring `migrations/`.

diesel::table! {
    addresses (id) {
        id -> Uuid,
        #[max_length = 200]
        line -> Varchar,
        #[max_length = 20]
        number -> Varchar,
        #[max_length = 100]
        city -> Varchar,
        #[max_length = 100]
        state -> Varchar,
        #[max_length = 20]
        zip_code -> Varchar,
        #[max_length = 100]
        country -> Varchar,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 120]
        name -> Varchar,
        #[max_length = 255]
        email -> Varchar,
        password_hash -> Text,
        #[max_length = 1]
        profile -> Varchar,
        address_id -> Nullable<Uuid>,
        date_of_birth -> Nullable<Date>,
        #[max_length = 1]
        sex -> Nullable<Varchar>,
        #[max_length = 20]
        phone -> Nullable<Varchar>,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    professional_credentials (id) {
        id -> Uuid,
        professional_id -> Uuid,
        #[max_length = 20]
        credential_type -> Varchar,
        #[max_length = 50]
        credential_number -> Varchar,
        biography -> Nullable<Text>,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    professional_details (id) {
        id -> Uuid,
        professional_id -> Uuid,
        experience_years -> Nullable<Int4>,
        specialties -> Array<Text>,
        online_service -> Bool,
        presential_service -> Bool,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    customer_professional_bonds (id) {
        id -> Uuid,
        customer_id -> Uuid,
        professional_id -> Uuid,
        sender_id -> Uuid,
        #[max_length = 1]
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    appointments (id) {
        id -> Uuid,
        bond_id -> Uuid,
        requested_by -> Uuid,
        scheduled_at -> Timestamptz,
        #[max_length = 1]
        appointment_type -> Varchar,
        address_id -> Nullable<Uuid>,
        #[max_length = 1]
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    exercises (id) {
        id -> Uuid,
        #[max_length = 120]
        name -> Varchar,
        instructions -> Nullable<Text>,
        #[max_length = 50]
        category -> Varchar,
        primary_muscles -> Array<Text>,
        secondary_muscles -> Array<Text>,
        image_url -> Nullable<Text>,
        video_url -> Nullable<Text>,
        created_by_user_id -> Nullable<Uuid>,
        is_published -> Bool,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    routines (id) {
        id -> Uuid,
        personal_id -> Uuid,
        #[max_length = 120]
        title -> Varchar,
        #[max_length = 1]
        goal -> Varchar,
        #[max_length = 1]
        difficulty -> Varchar,
        weeks -> Nullable<Int4>,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    customer_routines (id) {
        id -> Uuid,
        routine_id -> Uuid,
        customer_id -> Uuid,
        expires_at -> Nullable<Timestamptz>,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    workout_templates (id) {
        id -> Uuid,
        routine_id -> Uuid,
        #[max_length = 120]
        title -> Varchar,
        description -> Nullable<Text>,
        position -> Int4,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    exercise_templates (id) {
        id -> Uuid,
        workout_template_id -> Uuid,
        exercise_id -> Uuid,
        position -> Int4,
        target_sets -> Int4,
        target_reps -> Int4,
        target_load -> Nullable<Float8>,
        rest_seconds -> Nullable<Int4>,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    workout_sessions (id) {
        id -> Uuid,
        workout_template_id -> Uuid,
        customer_id -> Uuid,
        #[max_length = 2]
        status -> Varchar,
        started_at -> Timestamptz,
        ended_at -> Nullable<Timestamptz>,
        total_volume -> Nullable<Float8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    exercise_sessions (id) {
        id -> Uuid,
        workout_session_id -> Uuid,
        exercise_template_id -> Nullable<Uuid>,
        exercise_id -> Uuid,
        position -> Int4,
        #[max_length = 2]
        status -> Varchar,
        started_at -> Nullable<Timestamptz>,
        ended_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    set_sessions (id) {
        id -> Uuid,
        exercise_session_id -> Uuid,
        set_number -> Int4,
        load -> Nullable<Float8>,
        reps -> Nullable<Int4>,
        completed -> Bool,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    professional_feedbacks (id) {
        id -> Uuid,
        customer_id -> Uuid,
        professional_id -> Uuid,
        rating -> Int2,
        testimony -> Nullable<Text>,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    customer_feedbacks (id) {
        id -> Uuid,
        professional_id -> Uuid,
        customer_id -> Uuid,
        rating -> Int2,
        testimony -> Nullable<Text>,
        status -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    favorite_professionals (id) {
        id -> Uuid,
        customer_id -> Uuid,
        professional_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(users -> addresses (address_id));
diesel::joinable!(professional_credentials -> users (professional_id));
diesel::joinable!(professional_details -> users (professional_id));
diesel::joinable!(appointments -> customer_professional_bonds (bond_id));
diesel::joinable!(appointments -> addresses (address_id));
diesel::joinable!(exercises -> users (created_by_user_id));
diesel::joinable!(routines -> users (personal_id));
diesel::joinable!(customer_routines -> routines (routine_id));
diesel::joinable!(workout_templates -> routines (routine_id));
diesel::joinable!(exercise_templates -> workout_templates (workout_template_id));
diesel::joinable!(exercise_templates -> exercises (exercise_id));
diesel::joinable!(workout_sessions -> workout_templates (workout_template_id));
diesel::joinable!(workout_sessions -> users (customer_id));
diesel::joinable!(exercise_sessions -> workout_sessions (workout_session_id));
diesel::joinable!(exercise_sessions -> exercises (exercise_id));
diesel::joinable!(set_sessions -> exercise_sessions (exercise_session_id));

diesel::allow_tables_to_appear_in_same_query!(
    addresses,
    users,
    professional_credentials,
    professional_details,
    customer_professional_bonds,
    appointments,
    exercises,
    routines,
    customer_routines,
    workout_templates,
    exercise_templates,
    workout_sessions,
    exercise_sessions,
    set_sessions,
    professional_feedbacks,
    customer_feedbacks,
    favorite_professionals,
);
