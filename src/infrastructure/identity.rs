use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Secret;
use crate::domain::errors::AuthError;
use crate::domain::ports::IdentityVerifier;

/// Claims carried by a storefront identity token.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// User id
    pub sub: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
}

/// Verifies HS256-signed bearer tokens against a shared secret.
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &Secret) -> Self {
        JwtIdentityVerifier {
            key: DecodingKey::from_secret(secret.expose().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<String, AuthError> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map_err(|e| {
                log::debug!("identity token rejected: {e}");
                AuthError::InvalidToken(e.to_string())
            })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("token has no subject".to_string()));
        }
        Ok(data.claims.sub)
    }
}
