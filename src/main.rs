//! Renombra las imágenes nuevas del repositorio con un resumen de su contenido:
//! MinerU extrae el texto, un LLM lo resume y el resultado se commitea con git.
//! Pensado para ejecutarse en un job de GitHub Actions (ver `GITHUB_*`).

mod app_state;
mod bundle;
mod config;
mod driver;
mod error;
mod event;
mod extractor;
mod github;
mod llm;
mod models;
mod naming;
mod poll;
mod rename;
mod vcs;

use std::process::ExitCode;

use crate::app_state::AppState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` sólo existe en local; en CI todo llega por entorno.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Sin credenciales de GitHub o MinerU no hay nada que hacer: salida 1.
    let cfg = match config::AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("Configuración incompleta: {err}. Revisa GITHUB_TOKEN, GITHUB_REF_NAME, GITHUB_REPOSITORY, MINERU_API_ENDPOINT y MINERU_API_TOKEN");
            return ExitCode::FAILURE;
        }
    };

    // Un único cliente HTTP compartido por MinerU, el LLM y GitHub.
    let state = match AppState::from_config(cfg) {
        Ok(state) => state,
        Err(err) => {
            error!("Error inicializando los clientes: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    // Un error fatal (evento ilegible, commit/push fallido...) marca el job como fallido.
    match driver::run(&state).await {
        Ok(report) => {
            info!("✅ {report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}
