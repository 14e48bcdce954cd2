//! Construcción de URLs, derivación de rutas locales y saneado de nombres.

use std::path::Path;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::{config::AppConfig, models::SourceUrls};

/// Directorio raíz vigilado dentro del repositorio.
pub const IMAGES_DIR: &str = "images/";

/// Extensiones raster que se procesan (comparación sin distinguir mayúsculas).
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Todo se codifica salvo alfanuméricos ASCII, `-_.~` y los separadores `/` y `:`.
const RAW_URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/')
    .remove(b':');

/// `true` si la ruta está bajo `images/` y tiene una extensión de imagen.
pub fn is_candidate_image(path: &str) -> bool {
    if !path.starts_with(IMAGES_DIR) {
        return false;
    }
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Sustituye cada carácter no alfanumérico por `_`.
///
/// La correspondencia es carácter a carácter: el resultado tiene el mismo
/// número de caracteres que la entrada. Los alfanuméricos Unicode (por
/// ejemplo ideogramas CJK) se conservan.
pub fn sanitize_filename(summary: &str) -> String {
    summary
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// URLs raw y web para una ruta del repositorio en la rama/tag en curso.
pub fn source_urls(cfg: &AppConfig, path: &str) -> SourceUrls {
    let (owner, repo) = cfg.repo_parts();
    let raw = format!(
        "{}/{owner}/{repo}/{}/{path}",
        cfg.github_raw_url, cfg.ref_name
    );
    // Rama y ruta van codificadas: `#`, `?` o `%` en un nombre no deben
    // convertirse en fragmento, query o escape al volver a parsear la URL.
    let web = format!(
        "{}/blob/{}/{}",
        cfg.github_repository,
        utf8_percent_encode(&cfg.ref_name, RAW_URL_ENCODE_SET),
        utf8_percent_encode(path, RAW_URL_ENCODE_SET)
    );
    SourceUrls {
        raw_url: utf8_percent_encode(&raw, RAW_URL_ENCODE_SET).to_string(),
        web_url: format!("{}/{web}", cfg.github_server_url),
    }
}

/// Convierte `https://github.com/OWNER/REPO/blob/RAMA/ruta/al/fichero` en
/// `ruta/al/fichero`.
///
/// Si se conoce la rama y ésta contiene `/` (p. ej. `12/merge`), se elimina
/// completa; si no, se descarta un único segmento. Devuelve `None` si la URL
/// no tiene el número de segmentos esperado.
pub fn local_path_from_web_url(web_url: &str, branch: Option<&str>) -> Option<String> {
    let url = Url::parse(web_url).ok()?;
    url.host_str()?;

    let segments: Vec<String> = url
        .path_segments()?
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();

    // owner / repo / blob / rama / ruta...
    if segments.len() < 5 {
        return None;
    }
    let after_blob = &segments[3..];

    let branch_len = branch
        .map(|b| b.split('/').collect::<Vec<_>>())
        .filter(|parts| {
            parts.len() < after_blob.len()
                && after_blob.iter().zip(parts.iter()).all(|(seg, part)| seg == part)
        })
        .map(|parts| parts.len())
        .unwrap_or(1);

    let path = after_blob[branch_len..].join("/");
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Ruta nueva: mismo directorio, resumen saneado + extensión original.
pub fn renamed_path(local_path: &str, summary: &str) -> String {
    let path = Path::new(local_path);
    let mut file_name = sanitize_filename(summary);
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        file_name.push('.');
        file_name.push_str(ext);
    }
    match path.parent().and_then(|p| p.to_str()).filter(|p| !p.is_empty()) {
        Some(dir) => format!("{dir}/{file_name}"),
        None => file_name,
    }
}
