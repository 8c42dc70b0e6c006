use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::{Role, SessionClaims};
use crate::shared::AppError;

/// Configuration for JWT token operations. The server only validates
/// tokens; their lifetime is chosen by whoever issues them.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
}

impl TokenConfig {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Signs a token for the given user that expires after `valid_for`.
    /// Used by issuers sharing the secret and by tests; no route calls it.
    #[instrument(skip(self))]
    pub fn create_token(
        &self,
        user_id: &str,
        role: Role,
        valid_for: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + valid_for).timestamp() as usize;

        debug!(exp_timestamp = exp, "Creating JWT token with expiration");

        let claims = SessionClaims {
            user_id: user_id.to_string(),
            role,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::JwtError(e.to_string())
        })
    }

    /// Validates a JWT token and returns the claims if valid
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        debug!("Decoding and validating JWT token");

        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(
                user_id = %data.claims.user_id,
                role = %data.claims.role,
                exp = data.claims.exp,
                "JWT token decoded successfully"
            );
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::JwtError(e.to_string())
        })
    }
}
