use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::auth_ports::AccessGate;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::actor::{Actor, BinAction, Role};

/**
 * JWT claims carried by bearer tokens.
 *
 * Only the subject and role matter to the bin; everything else about the
 * session lives in the external identity provider.
 */
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier - the actor ID
    pub sub: String,

    /// Expiration timestamp (seconds since Unix epoch)
    pub exp: i64,

    /// Issued at timestamp (seconds since Unix epoch)
    pub iat: i64,

    /// JWT unique ID
    pub jti: String,

    /// Actor role for authorization checks
    pub role: String,
}

/// AccessGate backed by HS256 bearer tokens
pub struct JwtAccessGate {
    /// Secret key used for signing JWT tokens
    jwt_secret: String,
}

impl JwtAccessGate {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    /// Emite un token para un actor (herramientas y pruebas)
    pub fn issue_token(&self, actor: &Actor, ttl_secs: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: actor.id.clone(),
            exp: now + ttl_secs,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            role: actor.role.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| DomainError::internal_error("Auth", format!("Error al generar token: {}", e)))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => DomainError::unauthorized("Token expirado"),
            _ => DomainError::unauthorized(format!("Token inválido: {}", e)),
        })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl AccessGate for JwtAccessGate {
    async fn authenticate(&self, token: &str) -> Result<Actor> {
        let claims = self.validate_token(token)?;
        let role: Role = claims.role.parse()?;

        tracing::debug!("Actor autenticado: {} ({})", claims.sub, role);
        Ok(Actor::new(claims.sub, role))
    }

    fn authorize(&self, role: Role, action: BinAction) -> bool {
        role.allows(action)
    }
}
