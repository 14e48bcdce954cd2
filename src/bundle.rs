//! Descarga del bundle de resultados de MinerU, extracción del markdown y
//! archivado del zip en una release de GitHub.

use std::io::{Cursor, Read};

use reqwest::Client;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::{config::AppConfig, error::ApiError, github::GithubClient};

#[derive(Debug, Clone)]
pub struct BundleProcessor {
    client: Client,
    github: GithubClient,
    release_tag: String,
    asset_name: String,
}

impl BundleProcessor {
    pub fn new(client: Client, github: GithubClient, cfg: &AppConfig) -> Self {
        Self {
            client,
            github,
            release_tag: cfg.ref_name.clone(),
            asset_name: cfg.release_asset_name.clone(),
        }
    }

    /// Descarga el bundle y devuelve el texto del primer markdown que contenga.
    ///
    /// `Err` sólo para fallos de descarga; `Ok(None)` si el zip no es legible o
    /// no tiene ningún `.md`. El archivado en la release nunca afecta al resultado.
    pub async fn process(&self, bundle_url: &str) -> Result<Option<String>, ApiError> {
        info!("Descargando bundle: {bundle_url}");
        let bytes = self.download(bundle_url).await?;
        let markdown = first_markdown_entry(&bytes);

        // Archivado best-effort: un fallo se registra y se ignora.
        if let Err(err) = self
            .github
            .archive_bundle(&self.release_tag, &self.asset_name, bytes)
            .await
        {
            warn!(
                "No se pudo subir {} a la release {}: {err}",
                self.asset_name, self.release_tag
            );
        }

        Ok(markdown)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Primer fichero `.md` (en el orden del directorio del zip) decodificado como UTF-8.
pub fn first_markdown_entry(bytes: &[u8]) -> Option<String> {
    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(err) => {
            warn!("El bundle no es un zip válido: {err}");
            return None;
        }
    };

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Entrada {index} ilegible en el bundle: {err}");
                return None;
            }
        };
        if !entry.name().ends_with(".md") {
            continue;
        }

        let name = entry.name().to_string();
        let mut content = String::new();
        return match entry.read_to_string(&mut content) {
            Ok(_) => {
                debug!(entry = %name, "Markdown encontrado en el bundle");
                Some(content)
            }
            Err(err) => {
                warn!("No se pudo leer {name} como UTF-8: {err}");
                None
            }
        };
    }

    None
}
