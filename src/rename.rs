//! Orquestación del renombrado de una imagen: bundle → resumen → ruta nueva → `git mv`.

use tracing::{info, warn};

use crate::{
    app_state::AppState,
    error::RenameError,
    models::RenameOp,
    naming,
};

/// Descarga el bundle, resume su markdown y renombra la imagen con el resumen
/// saneado. Cualquier paso sin resultado corta el flujo antes del `mv`.
pub async fn rename_image(
    state: &AppState,
    bundle_url: &str,
    web_url: &str,
    local_path: &str,
) -> Result<RenameOp, RenameError> {
    let markdown = state
        .bundles
        .process(bundle_url)
        .await
        .map_err(RenameError::BundleUnavailable)?
        .ok_or(RenameError::NoMarkdown)?;

    let summary = state
        .summarizer
        .summarize(&markdown)
        .await
        .ok_or(RenameError::NoSummary)?;
    info!("Resumen generado: {summary}");

    let derived = naming::local_path_from_web_url(web_url, Some(&state.config.ref_name))
        .ok_or_else(|| RenameError::UnparseableUrl(web_url.to_string()))?;
    if derived != local_path {
        warn!("La ruta derivada ({derived}) no coincide con la del evento ({local_path})");
    }

    let op = RenameOp {
        new_path: naming::renamed_path(&derived, &summary),
        old_path: derived,
    };
    if op.old_path == op.new_path {
        info!("El nombre ya coincide con el resumen: {}", op.old_path);
        return Ok(op);
    }

    state
        .vcs
        .mv(&op.old_path, &op.new_path)
        .await
        .map_err(RenameError::Move)?;
    Ok(op)
}
