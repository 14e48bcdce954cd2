//! Recorrido del conjunto de cambios del evento de CI: una imagen cada vez,
//! de principio a fin (envío → sondeo → bundle → resumen → renombrado → commit).

use std::path::Path;

use tracing::{error, info, warn};

use crate::{
    app_state::AppState,
    config::RenameFailurePolicy,
    error::FatalError,
    event::{self, TriggerEvent},
    naming, poll, rename,
};

pub const COMMIT_MESSAGE_PREFIX: &str = "Renombrar imagen (IA)";

/// Resumen de los resultados de una ejecución.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub candidates: usize,
    pub renamed: usize,
    pub unchanged: usize,
    pub skipped_missing: usize,
    pub skipped_extraction: usize,
    pub rename_failures: usize,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: {} imágenes candidatas, {} renombradas, {} sin cambios, {} ya no existían, {} omitidas por extracción, {} renombrados fallidos.",
            self.candidates,
            self.renamed,
            self.unchanged,
            self.skipped_missing,
            self.skipped_extraction,
            self.rename_failures
        )
    }
}

/// Ejecuta la automatización completa. `Err` implica código de salida 1.
pub async fn run(state: &AppState) -> Result<RunReport, FatalError> {
    let event_path = state
        .config
        .event_path
        .as_deref()
        .filter(|p| p.is_file())
        .ok_or_else(|| FatalError::NoEventPayload(state.config.event_path.clone()))?;

    let trigger = TriggerEvent::load(event_path).map_err(FatalError::InvalidPayload)?;
    if trigger == TriggerEvent::Unsupported {
        return Err(FatalError::UnsupportedEvent);
    }

    let files = trigger
        .changed_files(&state.github)
        .await
        .map_err(FatalError::ChangeSet)?;
    let images = event::candidate_images(&files);

    let mut report = RunReport {
        candidates: images.len(),
        ..RunReport::default()
    };
    if images.is_empty() {
        info!("No hay imágenes que procesar");
        return Ok(report);
    }
    info!("Imágenes a procesar: {images:?}");

    for image in &images {
        process_image(state, image, &mut report).await?;
    }

    info!("{report}");
    Ok(report)
}

async fn process_image(
    state: &AppState,
    image: &str,
    report: &mut RunReport,
) -> Result<(), FatalError> {
    // Ya renombrada (o borrada) en una ejecución anterior.
    if !state.config.repo_workdir.join(image).is_file() {
        info!(file = %image, "La imagen ya no existe en el árbol de trabajo, se omite");
        report.skipped_missing += 1;
        return Ok(());
    }

    let urls = naming::source_urls(&state.config, image);
    info!("URL raw codificada: {}", urls.raw_url);

    let handle = match state.extractor.submit(&urls.raw_url).await {
        Ok(handle) => handle,
        Err(err) => {
            warn!(file = %image, "No se pudo crear la tarea en MinerU: {err}");
            report.skipped_extraction += 1;
            return Ok(());
        }
    };

    let outcome = poll::wait_for_bundle(
        state.extractor.as_ref(),
        state.sleeper.as_ref(),
        &state.config.poll_policy,
        &handle,
    )
    .await;
    let Some(bundle_url) = outcome.bundle_url() else {
        warn!(file = %image, "No se obtuvo full_zip_url, se omite el fichero");
        report.skipped_extraction += 1;
        return Ok(());
    };

    match rename::rename_image(state, &bundle_url, &urls.web_url, image).await {
        Ok(op) if op.old_path == op.new_path => {
            report.unchanged += 1;
        }
        Ok(op) => {
            info!("Renombrado {op}");
            commit_rename(state, image).await?;
            report.renamed += 1;
        }
        Err(err) => {
            error!(file = %image, "Renombrado fallido: {err}");
            report.rename_failures += 1;
            if state.config.rename_failure_policy == RenameFailurePolicy::Abort {
                return Err(FatalError::Rename {
                    file: image.to_string(),
                    source: err,
                });
            }
        }
    }

    Ok(())
}

async fn commit_rename(state: &AppState, image: &str) -> Result<(), FatalError> {
    let file_name = Path::new(image)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.to_string());
    let message = format!("{COMMIT_MESSAGE_PREFIX}: {file_name}");

    let result: anyhow::Result<()> = async {
        state.vcs.add_all().await?;
        state.vcs.commit(&message).await?;
        state.vcs.push().await
    }
    .await;

    result.map_err(|source| FatalError::Commit {
        file: image.to_string(),
        source,
    })
}
