//! Lectura del payload del evento de CI y cálculo del conjunto de imágenes a procesar.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::{error::ApiError, github::GithubClient, naming};

/// Entrada de `added`/`modified`: GitHub envía rutas, pero se aceptan
/// también objetos con `filename`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Path(String),
    Object { filename: String },
}

impl FileEntry {
    fn into_path(self) -> String {
        match self {
            Self::Path(path) | Self::Object { filename: path } => path,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PushCommit {
    #[serde(default)]
    added: Vec<FileEntry>,
    #[serde(default)]
    modified: Vec<FileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestRef {
    number: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEvent {
    commits: Option<Vec<PushCommit>>,
    pull_request: Option<PullRequestRef>,
}

/// Evento de CI ya clasificado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Push: unión de rutas añadidas y modificadas de todos los commits.
    Push { files: Vec<String> },
    /// Pull request: la lista de ficheros se consulta a la API.
    PullRequest { number: u64 },
    Unsupported,
}

impl TriggerEvent {
    pub fn from_json(raw: &str) -> Result<Self> {
        let event: RawEvent =
            serde_json::from_str(raw).context("JSON del evento inválido")?;

        if let Some(commits) = event.commits {
            let mut files = Vec::new();
            for commit in commits {
                for entry in commit.added.into_iter().chain(commit.modified) {
                    let path = entry.into_path();
                    if !files.contains(&path) {
                        files.push(path);
                    }
                }
            }
            return Ok(Self::Push { files });
        }

        match event.pull_request {
            Some(pr) => Ok(Self::PullRequest { number: pr.number }),
            None => Ok(Self::Unsupported),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// Rutas modificadas por el evento. `Unsupported` devuelve una lista vacía;
    /// el llamador decide si eso es fatal.
    pub async fn changed_files(&self, github: &GithubClient) -> Result<Vec<String>, ApiError> {
        match self {
            Self::Push { files } => Ok(files.clone()),
            Self::PullRequest { number } => {
                info!("Evento pull_request #{number}: consultando ficheros a la API");
                github.list_pull_request_files(*number).await
            }
            Self::Unsupported => Ok(Vec::new()),
        }
    }
}

/// Filtra las rutas que son imágenes bajo `images/`, conservando el orden.
pub fn candidate_images(files: &[String]) -> Vec<String> {
    files
        .iter()
        .filter(|path| naming::is_candidate_image(path))
        .cloned()
        .collect()
}
