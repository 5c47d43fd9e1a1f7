//! Local access-token verification.
//!
//! Integrity and expiry only. There is no revocation list.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claims of a verified access token. Unknown claims are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token invalid: {0}")]
    Invalid(String),
}

/// HMAC verifier sharing its secret with the token issuer.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = leeway_secs;
        validation.validate_exp = true;
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
    }

    fn sign(secret: &str, alg: Algorithm, exp_offset: i64) -> String {
        let claims = json!({ "sub": 42, "exp": now() + exp_offset, "role": "admin" });
        encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token() {
        let verifier = TokenVerifier::new("shared-secret", 0);
        let claims = verifier.verify(&sign("shared-secret", Algorithm::HS256, 900)).unwrap();
        assert_eq!(claims.sub, Some(json!(42)));
        assert_eq!(claims.extra.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_hs512_accepted() {
        let verifier = TokenVerifier::new("shared-secret", 0);
        assert!(verifier.verify(&sign("shared-secret", Algorithm::HS512, 900)).is_ok());
    }

    #[test]
    fn test_expired_token() {
        let verifier = TokenVerifier::new("shared-secret", 0);
        let result = verifier.verify(&sign("shared-secret", Algorithm::HS256, -3600));
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let verifier = TokenVerifier::new("shared-secret", 0);
        let result = verifier.verify(&sign("other-secret", Algorithm::HS256, 900));
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let verifier = TokenVerifier::new("shared-secret", 0);
        assert!(matches!(verifier.verify("not-a-jwt"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_missing_exp_is_invalid() {
        let token = encode(
            &Header::default(),
            &json!({ "sub": "u1" }),
            &EncodingKey::from_secret(b"shared-secret"),
        )
        .unwrap();
        let verifier = TokenVerifier::new("shared-secret", 0);
        assert!(verifier.verify(&token).is_err());
    }
}
