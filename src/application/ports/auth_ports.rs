use async_trait::async_trait;

use crate::common::errors::{DomainError, Result};
use crate::domain::entities::actor::{Actor, BinAction, Role};

/// Puerta de acceso externa: identifica al actor y decide sus permisos
#[async_trait]
pub trait AccessGate: Send + Sync + 'static {
    /// Resuelve el actor a partir de las credenciales de la petición.
    /// Falla con `Unauthorized`.
    async fn authenticate(&self, token: &str) -> Result<Actor>;

    /// Indica si el rol puede ejecutar la acción
    fn authorize(&self, role: Role, action: BinAction) -> bool;
}

/// Comprueba un permiso y lo convierte en error `Forbidden`
pub fn ensure_authorized(gate: &dyn AccessGate, actor: &Actor, action: BinAction) -> Result<()> {
    if gate.authorize(actor.role, action) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "Actor {} with role {} may not perform {:?}",
            actor.id, actor.role, action
        )))
    }
}
