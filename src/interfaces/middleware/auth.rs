use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::common::di::AppState;
use crate::common::errors::DomainError;
use crate::domain::entities::actor::Actor;
use crate::interfaces::errors::ApiError;

/// Actor autenticado de la petición actual
#[derive(Clone, Debug)]
pub struct CurrentActor(pub Actor);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| DomainError::unauthorized("Token no proporcionado"))?;

        let actor = state.access_gate.authenticate(token).await?;
        Ok(CurrentActor(actor))
    }
}
