use nutrifit_shared::errors::AppError;
use nutrifit_shared::middleware::encode_token;
use nutrifit_shared::types::auth::{AccessToken, Claims, JwtSecret};

use crate::models::User;

/// Signs an HS256 access token for `user` valid for `ttl_secs`.
pub fn create_access_token(user: &User, secret: &JwtSecret, ttl_secs: i64) -> Result<AccessToken, AppError> {
    let claims = Claims::new(user.id, user.profile, ttl_secs);
    let token = encode_token(&claims, secret)?;
    Ok(AccessToken::bearer(token, ttl_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nutrifit_shared::middleware::decode_token;
    use nutrifit_shared::types::auth::UserProfile;
    use uuid::Uuid;

    fn user(profile: UserProfile) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Carla".into(),
            email: "carla@example.com".into(),
            password_hash: String::new(),
            profile,
            address_id: None,
            date_of_birth: None,
            sex: None,
            phone: None,
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_carries_user_and_profile() {
        let secret = JwtSecret::new("test-secret");
        let user = user(UserProfile::Nutritionist);
        let token = create_access_token(&user, &secret, 600).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 600);

        let claims = decode_token(&token.access_token, &secret).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.profile, UserProfile::Nutritionist);
        assert_eq!(claims.exp - claims.iat, 600);
    }
}
