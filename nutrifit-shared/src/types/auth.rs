use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

crate::coded_enum! {
    /// The kind of account a user holds.
    pub enum UserProfile {
        Personal => "P",
        Nutritionist => "N",
        Student => "S",
    }
}

impl UserProfile {
    /// Personal trainers and nutritionists are professionals; students are customers.
    pub fn is_professional(&self) -> bool {
        matches!(self, UserProfile::Personal | UserProfile::Nutritionist)
    }

    pub fn is_customer(&self) -> bool {
        matches!(self, UserProfile::Student)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub profile: UserProfile,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, profile: UserProfile, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            profile,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub profile: UserProfile,
    pub token_id: Uuid,
}

impl AuthUser {
    pub fn is_professional(&self) -> bool {
        self.profile.is_professional()
    }

    pub fn is_customer(&self) -> bool {
        self.profile.is_customer()
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            profile: claims.profile,
            token_id: claims.jti,
        }
    }
}

/// HMAC secret used to sign and verify access tokens.
#[derive(Clone)]
pub struct JwtSecret(Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Router state the auth extractors can read the signing secret from.
pub trait AuthState {
    fn jwt_secret(&self) -> JwtSecret;
}

impl AuthState for JwtSecret {
    fn jwt_secret(&self) -> JwtSecret {
        self.clone()
    }
}

impl<T: AuthState + ?Sized> AuthState for Arc<T> {
    fn jwt_secret(&self) -> JwtSecret {
        (**self).jwt_secret()
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(..)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AccessToken {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn professional_profiles() {
        assert!(UserProfile::Personal.is_professional());
        assert!(UserProfile::Nutritionist.is_professional());
        assert!(!UserProfile::Student.is_professional());
        assert!(UserProfile::Student.is_customer());
    }

    #[test]
    fn claims_expire_after_duration() {
        let fresh = Claims::new(Uuid::new_v4(), UserProfile::Student, 60);
        assert!(!fresh.is_expired());
        let stale = Claims::new(Uuid::new_v4(), UserProfile::Student, -60);
        assert!(stale.is_expired());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = JwtSecret::new("super-secret");
        assert_eq!(format!("{secret:?}"), "JwtSecret(..)");
    }
}
