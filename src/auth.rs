use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::models::User;

/// Claims carried by a bearer token. Trusted once signature-verified;
/// handlers that need fresh account state re-query the users table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Account email at issue time
    pub email: String,
    /// Role claim, `user` or `admin`
    pub role: String,
    /// Issued at (UTC timestamp)
    pub iat: usize,
    /// Expiration time (UTC timestamp)
    pub exp: usize,
}

/// Sign a token for a freshly authenticated user.
pub fn issue_token(
    user: &User,
    secret: &str,
    token_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
        iat: now as usize,
        exp: (now + token_days * 24 * 3600) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the decoded claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: "u1".into(),
            email: "a@x.com".into(),
            password_hash: "hash".into(),
            display_name: "Alice".into(),
            phone_number: None,
            role: "user".into(),
            is_active: true,
            login_attempts: 0,
            last_login_at: None,
            created_at: "2025-01-01 00:00:00".into(),
            updated_at: "2025-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let token = issue_token(&test_user(), "secret", 7).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "user");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&test_user(), "secret", 7).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not-a-token", "secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative lifetime puts exp in the past, beyond default leeway
        let token = issue_token(&test_user(), "secret", -1).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn expiry_matches_configured_days() {
        let token = issue_token(&test_user(), "secret", 7).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }
}
