use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::domain::errors::DomainError;
use crate::domain::identity::{Identity, ADMIN_ROLE};
use crate::domain::ports::IdentityProvider;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    iat: i64,
    exp: i64,
}

/// Resolves HS256 bearer tokens issued by the account service.
pub struct JwtIdentityProvider {
    cfg: JwtConfig,
}

impl JwtIdentityProvider {
    pub fn new(cfg: JwtConfig) -> Self {
        Self { cfg }
    }

    /// Mints a token the provider accepts. Token issuance belongs to the account service;
    /// this exists for local tooling and tests.
    pub fn issue(
        &self,
        user_id: Uuid,
        role: Option<&str>,
        lifetime_secs: i64,
    ) -> Result<String, DomainError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: self.cfg.issuer.clone(),
            sub: user_id.to_string(),
            role: role.map(str::to_string),
            iat: now,
            exp: now + lifetime_secs,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.cfg.secret.as_bytes()),
        )
        .map_err(|e| DomainError::Internal(format!("token signing failed: {e}")))
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn resolve(&self, token: &str) -> Result<Identity, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.cfg.issuer.as_str()]);
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| DomainError::Unauthorized(e.to_string()))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|e| DomainError::Unauthorized(format!("invalid sub: {e}")))?;
        Ok(Identity {
            user_id,
            is_admin: data.claims.role.as_deref() == Some(ADMIN_ROLE),
        })
    }
}
