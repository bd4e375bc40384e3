use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthState, AuthUser, Claims, JwtSecret};

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let secret = state.jwt_secret();
        let claims = decode_token(&token, &secret)?;

        if claims.is_expired() {
            return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
        }

        Ok(AuthUser::from(claims))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "authorization header must use Bearer scheme"))
}

/// Signs `claims` with HS256.
pub fn encode_token(claims: &Claims, secret: &JwtSecret) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

/// Verifies signature and expiry of an HS256 token.
pub fn decode_token(token: &str, secret: &JwtSecret) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::new(ErrorCode::TokenExpired, "token has expired")
        }
        _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
    })?;

    Ok(token_data.claims)
}

/// Require a personal trainer or nutritionist
pub struct ProfessionalUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ProfessionalUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_professional() {
            return Err(AppError::new(ErrorCode::ProfessionalRequired, "professional access required"));
        }
        Ok(Self(user))
    }
}

/// Require a student (customer) account
pub struct CustomerUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CustomerUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_customer() {
            return Err(AppError::new(ErrorCode::CustomerRequired, "customer access required"));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::auth::UserProfile;
    use axum::http::Request;
    use uuid::Uuid;

    fn secret() -> JwtSecret {
        JwtSecret::new("test-secret")
    }

    fn parts_with(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn token_round_trip() {
        let claims = Claims::new(Uuid::new_v4(), UserProfile::Nutritionist, 300);
        let token = encode_token(&claims, &secret()).unwrap();
        let decoded = decode_token(&token, &secret()).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.profile, UserProfile::Nutritionist);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), UserProfile::Student, 300);
        let token = encode_token(&claims, &secret()).unwrap();
        let err = decode_token(&token, &JwtSecret::new("other")).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), UserProfile::Student, -3600);
        let token = encode_token(&claims, &secret()).unwrap();
        let err = decode_token(&token, &secret()).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::TokenExpired);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &secret()).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let mut parts = parts_with(Some("Basic abc".into()));
        let err = AuthUser::from_request_parts(&mut parts, &secret()).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn professional_extractor_rejects_students() {
        let claims = Claims::new(Uuid::new_v4(), UserProfile::Student, 300);
        let token = encode_token(&claims, &secret()).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let result = ProfessionalUser::from_request_parts(&mut parts, &secret()).await;
        assert_eq!(result.err().map(|e| e.error_code()), Some(ErrorCode::ProfessionalRequired));

        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let customer = CustomerUser::from_request_parts(&mut parts, &secret()).await.unwrap();
        assert_eq!(customer.0.id, claims.sub);
    }

    #[tokio::test]
    async fn shared_state_behind_arc_extracts() {
        struct RouterState {
            jwt: JwtSecret,
        }
        impl AuthState for RouterState {
            fn jwt_secret(&self) -> JwtSecret {
                self.jwt.clone()
            }
        }

        let state = std::sync::Arc::new(RouterState { jwt: secret() });
        let claims = Claims::new(Uuid::new_v4(), UserProfile::Personal, 300);
        let token = encode_token(&claims, &secret()).unwrap();

        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, claims.sub);

        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let pro = ProfessionalUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(pro.0.profile, UserProfile::Personal);
    }
}
