//! Bearer token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Verifies a raw token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HMAC-SHA256 validator with a shared secret.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The time window lives in `issued_at`/`expires_at`, not registered claims.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256JwtValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtValidator").finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use stockyard_core::WarehouseId;

    use crate::{PrincipalId, Role};

    fn mint(secret: &str, alg: Algorithm, ttl: Duration) -> (String, JwtClaims) {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: PrincipalId::new(),
            roles: vec![Role::new("clerk")],
            warehouse_ids: vec![WarehouseId::new(2)],
            issued_at: now - Duration::seconds(1),
            expires_at: now + ttl,
        };
        let token = encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        (token, claims)
    }

    #[test]
    fn accepts_token_signed_with_the_shared_secret() {
        let v = Hs256JwtValidator::new(b"s3cret".to_vec());
        let (token, claims) = mint("s3cret", Algorithm::HS256, Duration::minutes(5));
        assert_eq!(v.validate(&token, Utc::now()).unwrap(), claims);
    }

    #[test]
    fn rejects_wrong_secret_and_algorithm() {
        let v = Hs256JwtValidator::new(b"s3cret".to_vec());
        let (token, _) = mint("other", Algorithm::HS256, Duration::minutes(5));
        assert!(matches!(v.validate(&token, Utc::now()), Err(TokenValidationError::Malformed(_))));

        let (token, _) = mint("s3cret", Algorithm::HS512, Duration::minutes(5));
        assert!(matches!(v.validate(&token, Utc::now()), Err(TokenValidationError::Malformed(_))));

        assert!(v.validate("not-a-jwt", Utc::now()).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let v = Hs256JwtValidator::new(b"s3cret".to_vec());
        let (token, _) = mint("s3cret", Algorithm::HS256, Duration::minutes(5));
        let later = Utc::now() + Duration::minutes(10);
        assert_eq!(v.validate(&token, later), Err(TokenValidationError::Expired));
    }
}
