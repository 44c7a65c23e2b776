use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("invalid claims: {0}")]
    InvalidClaims(#[from] TokenValidationError),
}

/// Verifies a bearer token and returns its claims.
///
/// Takes `now` explicitly so validation stays deterministic under test.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

/// HMAC-SHA256 token validator.
///
/// Verification happens in two phases: `jsonwebtoken` checks the signature,
/// then [`validate_claims`] checks the time window. The registered `exp`/`iat`
/// checks are disabled because [`JwtClaims`] carries RFC 3339 timestamps
/// instead of the numeric registered claims.
pub struct Hs256JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use mercora_core::AccountId;

    use crate::Role;

    use super::*;

    const SECRET: &str = "test-secret";

    fn mint(secret: &str, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
        let claims = JwtClaims {
            sub: AccountId::new(),
            email: "buyer@example.com".to_string(),
            roles: vec![Role::new("buyer")],
            issued_at,
            expires_at,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_a_well_formed_token() {
        let now = Utc::now();
        let token = mint(SECRET, now - Duration::minutes(1), now + Duration::hours(1));

        let claims = Hs256JwtValidator::new(SECRET)
            .validate(&token, now)
            .unwrap();

        assert_eq!(claims.email, "buyer@example.com");
        assert_eq!(claims.roles, vec![Role::new("buyer")]);
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let now = Utc::now();
        let token = mint("other-secret", now - Duration::minutes(1), now + Duration::hours(1));

        let err = Hs256JwtValidator::new(SECRET)
            .validate(&token, now)
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn rejects_an_expired_token() {
        let now = Utc::now();
        let token = mint(SECRET, now - Duration::hours(2), now - Duration::hours(1));

        let err = Hs256JwtValidator::new(SECRET)
            .validate(&token, now)
            .unwrap_err();

        assert!(matches!(
            err,
            AuthError::InvalidClaims(TokenValidationError::Expired)
        ));
    }

    #[test]
    fn rejects_garbage() {
        let err = Hs256JwtValidator::new(SECRET)
            .validate("not-a-token", Utc::now())
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
