use std::fmt::{Display, Formatter, Result as FmtResult};
use std::error::Error as StdError;
use thiserror::Error;

/// Tipos de errores comunes en toda la aplicación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entrada de papelera o documento no encontrado
    NotFound,
    /// La entrada ya fue restaurada
    AlreadyRestored,
    /// La entrada ya fue eliminada permanentemente
    AlreadyPurged,
    /// Restauración intentada después de `expires_at`
    Expired,
    /// Entrada activa duplicada o identidad ya ocupada
    Conflict,
    /// Actor no autenticado
    Unauthorized,
    /// Actor sin permisos para la acción
    Forbidden,
    /// Tiempo de espera agotado en el almacén; se puede reintentar
    Transient,
    /// Colección desconocida o snapshot malformado
    Invalid,
    /// Error interno del sistema
    InternalError,
}

impl ErrorKind {
    /// Código estable expuesto a los clientes
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyRestored => "already_restored",
            ErrorKind::AlreadyPurged => "already_purged",
            ErrorKind::Expired => "expired",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Transient => "transient",
            ErrorKind::Invalid => "invalid",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// Indica si el llamante puede reintentar la operación
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ErrorKind::NotFound => write!(f, "Not Found"),
            ErrorKind::AlreadyRestored => write!(f, "Already Restored"),
            ErrorKind::AlreadyPurged => write!(f, "Already Purged"),
            ErrorKind::Expired => write!(f, "Expired"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ErrorKind::Forbidden => write!(f, "Forbidden"),
            ErrorKind::Transient => write!(f, "Transient"),
            ErrorKind::Invalid => write!(f, "Invalid"),
            ErrorKind::InternalError => write!(f, "Internal Error"),
        }
    }
}

/// Error base de dominio que proporciona contexto detallado
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct DomainError {
    /// Tipo de error
    pub kind: ErrorKind,
    /// Tipo de entidad afectada (ej: "BinEntry", "Sop")
    pub entity_type: &'static str,
    /// Identificador de la entidad si está disponible
    pub entity_id: Option<String>,
    /// Mensaje descriptivo del error
    pub message: String,
    /// Error fuente (opcional)
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

pub type Result<T, E = DomainError> = std::result::Result<T, E>;

impl DomainError {
    /// Crea un nuevo error de dominio
    pub fn new<S: Into<String>>(
        kind: ErrorKind,
        entity_type: &'static str,
        message: S,
    ) -> Self {
        Self {
            kind,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Crea un error de entidad no encontrada
    pub fn not_found<S: Into<String>>(entity_type: &'static str, entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::NotFound,
            entity_type,
            entity_id: Some(id.clone()),
            message: format!("{} not found: {}", entity_type, id),
            source: None,
        }
    }

    /// Crea un error de conflicto sobre una identidad ya ocupada
    pub fn conflict<S: Into<String>>(entity_type: &'static str, entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::Conflict,
            entity_type,
            entity_id: Some(id.clone()),
            message: format!("{} already exists: {}", entity_type, id),
            source: None,
        }
    }

    /// Crea un error para entradas que ya alcanzaron un estado terminal
    pub fn already_restored<S: Into<String>>(entity_type: &'static str, entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::AlreadyRestored,
            entity_type,
            entity_id: Some(id.clone()),
            message: format!("{} was already restored: {}", entity_type, id),
            source: None,
        }
    }

    pub fn already_purged<S: Into<String>>(entity_type: &'static str, entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::AlreadyPurged,
            entity_type,
            entity_id: Some(id.clone()),
            message: format!("{} was permanently deleted: {}", entity_type, id),
            source: None,
        }
    }

    /// Crea un error de entrada expirada
    pub fn expired<S: Into<String>>(entity_type: &'static str, entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::Expired,
            entity_type,
            entity_id: Some(id.clone()),
            message: format!("{} is past its retention window: {}", entity_type, id),
            source: None,
        }
    }

    /// Crea un error de tiempo agotado (reintentable)
    pub fn transient<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::Transient, entity_type, message)
    }

    /// Crea un error interno
    pub fn internal_error<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::InternalError, entity_type, message)
    }

    /// Crea un error de actor no autenticado
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Unauthorized, "Actor", message)
    }

    /// Crea un error de acceso denegado
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Forbidden, "Actor", message)
    }

    /// Crea un error de validación
    pub fn invalid<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::Invalid, entity_type, message)
    }

    /// Establece el ID de la entidad
    pub fn with_id<S: Into<String>>(mut self, entity_id: S) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Establece el error fuente
    pub fn with_source<E: StdError + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Trait para añadir contexto a los errores
pub trait ErrorContext<T, E> {
    fn with_context<C, F>(self, context: F) -> Result<T, DomainError>
    where
        C: Into<String>,
        F: FnOnce() -> C;

    fn with_error_kind(self, kind: ErrorKind, entity_type: &'static str) -> Result<T, DomainError>;
}

impl<T, E: StdError + Send + Sync + 'static> ErrorContext<T, E> for Result<T, E> {
    fn with_context<C, F>(self, context: F) -> Result<T, DomainError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            DomainError {
                kind: ErrorKind::InternalError,
                entity_type: "Unknown",
                entity_id: None,
                message: context().into(),
                source: Some(Box::new(e)),
            }
        })
    }

    fn with_error_kind(self, kind: ErrorKind, entity_type: &'static str) -> Result<T, DomainError> {
        self.map_err(|e| {
            DomainError {
                kind,
                entity_type,
                entity_id: None,
                message: format!("{}", e),
                source: Some(Box::new(e)),
            }
        })
    }
}

/// Macro para convertir errores específicos a DomainError
#[macro_export]
macro_rules! impl_from_error {
    ($error_type:ty, $entity_type:expr) => {
        impl From<$error_type> for DomainError {
            fn from(err: $error_type) -> Self {
                DomainError {
                    kind: ErrorKind::InternalError,
                    entity_type: $entity_type,
                    entity_id: None,
                    message: format!("{}", err),
                    source: Some(Box::new(err)),
                }
            }
        }
    };
}

// Implementación para errores estándar comunes
impl_from_error!(std::io::Error, "IO");
impl_from_error!(serde_json::Error, "Serialization");
