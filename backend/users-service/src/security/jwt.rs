//! HS256 token issuance and validation
//!
//! Access tokens and password-reset tokens share the signing key and are told
//! apart by the `purpose` claim. Reset tokens also carry `pcv`, the user's
//! password version at issue time, so a reset token dies with the first
//! password change after it was issued.

use crate::config::JwtConfig;
use crate::models::User;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const PURPOSE_ACCESS: &str = "access";
pub const PURPOSE_PASSWORD_RESET: &str = "password_reset";

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Same id under the name clients read
    pub user_id: String,
    pub user_name: String,
    pub iat: i64,
    pub exp: i64,
    pub purpose: String,
    /// Password version, reset tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcv: Option<i64>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid("malformed subject".into()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("{0}")]
    Invalid(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Password version of `user` as carried in reset tokens
pub fn password_version(user: &User) -> i64 {
    user.password_changed_at.timestamp_micros()
}

#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    reset_ttl: Duration,
}

impl JwtManager {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: to_chrono(config.access_ttl()),
            reset_ttl: to_chrono(config.reset_ttl()),
        }
    }

    pub fn issue_access(&self, user: &User) -> Result<String, TokenError> {
        self.sign(user, PURPOSE_ACCESS, None, Utc::now(), self.access_ttl)
    }

    pub fn issue_reset(&self, user: &User) -> Result<String, TokenError> {
        self.sign(
            user,
            PURPOSE_PASSWORD_RESET,
            Some(password_version(user)),
            Utc::now(),
            self.reset_ttl,
        )
    }

    /// Signature, expiry and purpose
    pub fn verify(&self, token: &str, purpose: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                other => TokenError::Invalid(format!("{:?}", other)),
            }
        })?;

        if data.claims.purpose != purpose {
            return Err(TokenError::Invalid(format!(
                "expected a {} token",
                purpose
            )));
        }
        Ok(data.claims)
    }

    /// A reset token must carry the password version it was issued for
    pub fn verify_reset(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token, PURPOSE_PASSWORD_RESET)?;
        if claims.pcv.is_none() {
            return Err(TokenError::Invalid("missing password version".into()));
        }
        Ok(claims)
    }

    fn sign(
        &self,
        user: &User,
        purpose: &str,
        pcv: Option<i64>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id.to_string(),
            user_name: user.user_name.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            purpose: purpose.to_string(),
            pcv,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

fn to_chrono(ttl: std::time::Duration) -> Duration {
    Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 1_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_ttl_secs: 7_200,
            reset_ttl_secs: 900,
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            user_name: "alice".into(),
            password_hash: "$argon2id$stub".into(),
            password_changed_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let jwt = JwtManager::new(&config("test-secret"));
        let user = user();

        let token = jwt.issue_access(&user).unwrap();
        let claims = jwt.verify(&token, PURPOSE_ACCESS).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.user_name, "alice");
        assert_eq!(claims.exp - claims.iat, 7_200);
        assert_eq!(claims.pcv, None);
        assert_eq!(claims.user_id, claims.sub);
    }

    #[test]
    fn test_payload_carries_user_id_claim() {
        let jwt = JwtManager::new(&config("test-secret"));
        let user = user();

        let token = jwt.issue_access(&user).unwrap();
        let payload = decode::<serde_json::Value>(&token, &jwt.decoding, &jwt.validation)
            .unwrap()
            .claims;

        assert_eq!(payload["userId"], user.id.to_string());
        assert_eq!(payload["sub"], user.id.to_string());
        assert_eq!(payload["userName"], "alice");
    }

    #[test]
    fn test_reset_token_carries_password_version() {
        let jwt = JwtManager::new(&config("test-secret"));
        let user = user();

        let claims = jwt.verify_reset(&jwt.issue_reset(&user).unwrap()).unwrap();
        assert_eq!(claims.pcv, Some(password_version(&user)));
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_purposes_are_not_interchangeable() {
        let jwt = JwtManager::new(&config("test-secret"));
        let user = user();

        let access = jwt.issue_access(&user).unwrap();
        assert!(matches!(jwt.verify_reset(&access), Err(TokenError::Invalid(_))));

        let reset = jwt.issue_reset(&user).unwrap();
        assert!(matches!(
            jwt.verify(&reset, PURPOSE_ACCESS),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let jwt = JwtManager::new(&config("test-secret"));
        let issued_at = Utc::now() - Duration::hours(2);

        let token = jwt
            .sign(
                &user(),
                PURPOSE_PASSWORD_RESET,
                Some(1),
                issued_at,
                Duration::minutes(15),
            )
            .unwrap();

        assert_eq!(jwt.verify_reset(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = JwtManager::new(&config("secret-a"))
            .issue_access(&user())
            .unwrap();
        let result = JwtManager::new(&config("secret-b")).verify(&token, PURPOSE_ACCESS);

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let jwt = JwtManager::new(&config("test-secret"));
        assert!(matches!(
            jwt.verify("not.a.token", PURPOSE_ACCESS),
            Err(TokenError::Invalid(_))
        ));
    }
}
