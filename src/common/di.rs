use std::sync::Arc;
use sqlx::PgPool;

use crate::application::ports::auth_ports::AccessGate;
use crate::application::ports::bin_ports::BinUseCase;
use crate::application::services::adapter_registry::AdapterRegistry;
use crate::application::services::bin_manager::BinManager;
use crate::application::services::document_adapter::{AnnouncementAdapter, SopAdapter, TeamBatchAdapter};
use crate::common::clock::{Clock, SystemClock};
use crate::common::config::AppConfig;
use crate::common::errors::DomainError;
use crate::domain::entities::announcement::Announcement;
use crate::domain::entities::sop::Sop;
use crate::domain::entities::team_batch::TeamBatch;
use crate::domain::repositories::bin_repository::BinRepository;
use crate::domain::repositories::document_repository::DocumentRepository;
use crate::infrastructure::repositories::bin_fs_repository::BinFsRepository;
use crate::infrastructure::repositories::document_fs_repository::DocumentFsRepository;
use crate::infrastructure::repositories::pg::BinPgRepository;
use crate::infrastructure::services::bin_expiry_scheduler::BinExpiryScheduler;
use crate::infrastructure::services::jwt_access_gate::JwtAccessGate;

/// Fábrica para los diferentes componentes de la aplicación
pub struct AppServiceFactory {
    config: AppConfig,
    clock: Arc<dyn Clock>,
}

impl AppServiceFactory {
    /// Crea una nueva fábrica de servicios con el reloj del sistema
    pub fn new(config: AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Inicializa los repositorios; con un pool de PostgreSQL la papelera vive en la base de datos
    pub fn create_repository_services(&self, db_pool: Option<Arc<PgPool>>) -> RepositoryServices {
        let storage_path = self.config.storage_path.as_path();
        let timeouts = self.config.timeouts.clone();

        let bin_repository: Arc<dyn BinRepository> = match db_pool {
            Some(pool) => {
                tracing::info!("Papelera respaldada por PostgreSQL");
                Arc::new(BinPgRepository::new(pool))
            },
            None => {
                tracing::info!("Papelera respaldada por índice JSON en {}", storage_path.display());
                Arc::new(BinFsRepository::new(storage_path, timeouts.clone()))
            }
        };

        RepositoryServices {
            bin_repository,
            sop_repository: Arc::new(DocumentFsRepository::<Sop>::new(storage_path, timeouts.clone())),
            team_batch_repository: Arc::new(DocumentFsRepository::<TeamBatch>::new(storage_path, timeouts.clone())),
            announcement_repository: Arc::new(DocumentFsRepository::<Announcement>::new(storage_path, timeouts)),
        }
    }

    /// Inicializa los servicios de la papelera
    pub fn create_bin_services(&self, repos: &RepositoryServices) -> Result<BinServices, DomainError> {
        let adapters = Arc::new(AdapterRegistry::new(
            Arc::new(SopAdapter::new(repos.sop_repository.clone())),
            Arc::new(TeamBatchAdapter::new(repos.team_batch_repository.clone())),
            Arc::new(AnnouncementAdapter::new(repos.announcement_repository.clone())),
        )?);

        let access_gate: Arc<dyn AccessGate> = Arc::new(JwtAccessGate::new(self.config.auth.jwt_secret.clone()));

        let bin_service: Arc<dyn BinUseCase> = Arc::new(BinManager::new(
            repos.bin_repository.clone(),
            adapters,
            access_gate.clone(),
            self.clock.clone(),
            self.config.bin.retention(),
            self.config.timeouts.store_timeout(),
        ));

        let scheduler = Arc::new(BinExpiryScheduler::new(
            bin_service.clone(),
            self.config.bin.cleanup_interval(),
        ));

        Ok(BinServices {
            bin_service,
            access_gate,
            scheduler,
        })
    }
}

/// Contenedor para servicios de repositorio
#[derive(Clone)]
pub struct RepositoryServices {
    pub bin_repository: Arc<dyn BinRepository>,
    pub sop_repository: Arc<dyn DocumentRepository<Sop>>,
    pub team_batch_repository: Arc<dyn DocumentRepository<TeamBatch>>,
    pub announcement_repository: Arc<dyn DocumentRepository<Announcement>>,
}

/// Contenedor para servicios de la papelera
#[derive(Clone)]
pub struct BinServices {
    pub bin_service: Arc<dyn BinUseCase>,
    pub access_gate: Arc<dyn AccessGate>,
    pub scheduler: Arc<BinExpiryScheduler>,
}

/// Estado global de la aplicación para dependency injection
#[derive(Clone)]
pub struct AppState {
    pub bin_service: Arc<dyn BinUseCase>,
    pub access_gate: Arc<dyn AccessGate>,
}

impl AppState {
    pub fn new(services: &BinServices) -> Self {
        Self {
            bin_service: services.bin_service.clone(),
            access_gate: services.access_gate.clone(),
        }
    }
}
