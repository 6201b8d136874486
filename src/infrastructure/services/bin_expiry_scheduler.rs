use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::application::dtos::bin_dto::SweepReport;
use crate::application::ports::bin_ports::BinUseCase;
use crate::common::errors::Result;

/// Servicio para la purga periódica de entradas expiradas de la papelera
pub struct BinExpiryScheduler {
    bin_service: Arc<dyn BinUseCase>,
    interval: Duration,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BinExpiryScheduler {
    pub fn new(bin_service: Arc<dyn BinUseCase>, interval: Duration) -> Self {
        Self {
            bin_service,
            // Mínimo 1 segundo
            interval: interval.max(Duration::from_secs(1)),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Inicia el trabajo de purga periódica. Llamadas repetidas no crean
    /// un segundo ciclo.
    #[instrument(skip(self))]
    pub fn start(&self) {
        let mut handle = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if handle.is_some() {
            debug!("El programador de purga ya está en marcha");
            return;
        }
        if self.cancel.is_cancelled() {
            warn!("El programador de purga ya fue detenido; no se reinicia");
            return;
        }

        let bin_service = self.bin_service.clone();
        let cancel = self.cancel.clone();
        let interval_duration = self.interval;

        info!("Iniciando purga de papelera con intervalo de {:?}", interval_duration);

        *handle = Some(tokio::spawn(async move {
            let mut interval = time::interval(interval_duration);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // El primer tick se completa de inmediato
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Purga de papelera cancelada");
                        break;
                    }
                    _ = interval.tick() => {
                        debug!("Ejecutando tarea programada de purga de papelera");
                        // Un ciclo en curso termina antes de atender la cancelación
                        if let Err(e) = Self::run_cycle(bin_service.as_ref()).await {
                            error!("Error en la purga programada de la papelera: {:?}", e);
                        }
                    }
                }
            }
        }));
    }

    /// Ejecuta un único ciclo de purga
    pub async fn run_cycle(bin_service: &dyn BinUseCase) -> Result<SweepReport> {
        let report = bin_service.purge_expired().await?;

        if report.failed > 0 {
            warn!(
                "Ciclo de purga con fallos: {} de {} entradas no se pudieron purgar",
                report.failed, report.examined
            );
        }
        Ok(report)
    }

    pub fn is_running(&self) -> bool {
        let handle = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Detiene el programador y espera a que termine el ciclo en curso
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("La tarea de purga terminó con error: {}", e);
            }
            info!("Programador de purga detenido");
        }
    }
}
