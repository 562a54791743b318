//! Access token handling
//!
//! Tokens are compact HS256 JWTs whose `sub` claim is the user ID. They are issued by the
//! account service; this backend only needs to verify them. Issuing is kept for tooling and
//! tests that need a valid token for a given user.

pub mod error;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use error::JwtError;

/// Token expiration time in seconds (7 days)
pub const TOKEN_EXPIRATION_SECS: i64 = 7 * 24 * 60 * 60;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
}

/// Verifies and issues HS256 access tokens
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    /// Creates a JWT manager from the shared secret
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a token for `user_id`, valid for [`TOKEN_EXPIRATION_SECS`]
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails
    pub fn issue_token(&self, user_id: &str) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + TOKEN_EXPIRATION_SECS,
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::EncodingError)
    }

    /// Validates signature and expiry, and optionally rejects tokens issued before `issued_after`
    ///
    /// # Errors
    ///
    /// Returns `JwtError::ValidationError` for malformed, forged or expired tokens and
    /// `JwtError::IssuedBeforeCutoff` for tokens older than the cutoff
    pub fn validate(&self, token: &str, issued_after: Option<i64>) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(JwtError::ValidationError)?;

        if issued_after.is_some_and(|cutoff| data.claims.iat < cutoff) {
            return Err(JwtError::IssuedBeforeCutoff);
        }

        Ok(data.claims)
    }
}
