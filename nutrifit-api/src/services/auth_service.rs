use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use nutrifit_shared::errors::{AppError, ErrorCode};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one number"));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one letter"));
    }
    Ok(())
}

/// Emails are unique case-insensitively; they are stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("squat2024").unwrap();
        assert_ne!(hash, "squat2024");
        assert!(verify_password("squat2024", &hash).unwrap());
        assert!(!verify_password("deadlift2024", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        let err = verify_password("whatever1", "not-a-phc-string").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InternalError);
    }

    #[test]
    fn weak_passwords_are_rejected() {
        for weak in ["short1", "onlyletters", "12345678"] {
            let err = validate_password(weak).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::PasswordTooWeak, "{weak}");
        }
        assert!(validate_password("treino123").is_ok());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana.Souza@Example.COM "), "ana.souza@example.com");
    }
}
