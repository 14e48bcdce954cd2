//! Bucle de sondeo acotado sobre una tarea de extracción.
//!
//! La política es fija: un número máximo de intentos y una espera constante
//! antes de cada intento, sin backoff exponencial. La espera se inyecta a
//! través de [`Sleeper`] para poder probar el bucle sin que pase tiempo real.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    extractor::ExtractionService,
    models::{TaskHandle, TaskState},
};

/// Política de reintentos del sondeo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Espera previa al intento `attempt` (empezando en 0).
    pub fn delay_for(&self, _attempt: u32) -> Duration {
        self.interval
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(20, Duration::from_secs(5))
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Espera real sobre el reloj de tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Resultado terminal del sondeo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// La tarea terminó y el bundle está disponible en esta URL.
    Ready(String),
    /// La tarea terminó en `failed` (o en `done` sin URL).
    Failed(Option<String>),
    /// Error de red o de JSON durante un intento: el bucle se corta ahí.
    Aborted(String),
    /// Se agotaron los intentos sin ver un estado terminal.
    Exhausted,
}

impl PollOutcome {
    pub fn bundle_url(self) -> Option<String> {
        match self {
            Self::Ready(url) => Some(url),
            _ => None,
        }
    }
}

/// Sondea la tarea hasta que llega a `done`/`failed` o se agotan los intentos.
pub async fn wait_for_bundle(
    service: &dyn ExtractionService,
    sleeper: &dyn Sleeper,
    policy: &PollPolicy,
    handle: &TaskHandle,
) -> PollOutcome {
    for attempt in 0..policy.max_attempts {
        sleeper.sleep(policy.delay_for(attempt)).await;

        let status = match service.fetch_status(handle).await {
            Ok(status) => status,
            Err(err) => {
                warn!(task_id = %handle.task_id, "Consulta de estado fallida: {err}");
                return PollOutcome::Aborted(err.to_string());
            }
        };

        match status.state {
            TaskState::Done => {
                return match status.full_zip_url {
                    Some(url) => PollOutcome::Ready(url),
                    None => {
                        warn!(task_id = %handle.task_id, "Tarea terminada sin full_zip_url");
                        PollOutcome::Failed(None)
                    }
                };
            }
            TaskState::Failed => {
                warn!(
                    task_id = %handle.task_id,
                    "La tarea de MinerU falló: {}",
                    status.err_msg.as_deref().unwrap_or("sin mensaje")
                );
                return PollOutcome::Failed(status.err_msg);
            }
            TaskState::Pending(state) => {
                info!(
                    "Tarea en proceso... (estado: {state}, intento {}/{})",
                    attempt + 1,
                    policy.max_attempts
                );
            }
        }
    }

    PollOutcome::Exhausted
}
