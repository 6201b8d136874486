use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::errors::{DomainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Editor => write!(f, "editor"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            other => Err(DomainError::unauthorized(format!("Unknown role: {}", other))),
        }
    }
}

/// Acciones sobre la papelera sujetas a autorización
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinAction {
    MoveToBin,
    /// Listar las entradas propias
    List,
    /// Ver y restaurar entradas de cualquier actor
    ListAll,
    Restore,
    Purge,
}

impl Role {
    /// Política por defecto de permisos por rol
    pub fn allows(&self, action: BinAction) -> bool {
        match self {
            Role::Admin => true,
            Role::Editor => matches!(action, BinAction::MoveToBin | BinAction::List | BinAction::Restore),
            Role::Viewer => matches!(action, BinAction::List),
        }
    }
}

/// Identidad autenticada que ejecuta una operación
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}
