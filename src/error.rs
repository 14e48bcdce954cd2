//! Errores tipados de la automatización.

use std::path::PathBuf;

use thiserror::Error;

/// Fallo al hablar con un servicio HTTP externo (MinerU, LLM, GitHub).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("error de transporte: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("respuesta HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("JSON de respuesta inválido: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("falta el campo '{0}' en la respuesta")]
    MissingField(&'static str),
}

/// Motivo por el que el orquestador de renombrado no pudo renombrar un fichero.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("no se pudo descargar el bundle: {0}")]
    BundleUnavailable(#[source] ApiError),

    #[error("el bundle no contiene ningún fichero markdown legible")]
    NoMarkdown,

    #[error("no se pudo resumir el contenido markdown")]
    NoSummary,

    #[error("no se pudo derivar la ruta local desde la URL: {0}")]
    UnparseableUrl(String),

    #[error("el movimiento del fichero falló: {0}")]
    Move(#[source] anyhow::Error),
}

/// Condiciones que terminan la ejecución completa con código de salida 1.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("no se encontró el fichero de evento (GITHUB_EVENT_PATH): {0:?}")]
    NoEventPayload(Option<PathBuf>),

    #[error("el payload del evento no es válido: {0}")]
    InvalidPayload(#[source] anyhow::Error),

    #[error("tipo de evento no soportado")]
    UnsupportedEvent,

    #[error("no se pudo obtener la lista de ficheros modificados: {0}")]
    ChangeSet(#[source] ApiError),

    #[error("el renombrado de {file} falló: {source}")]
    Rename {
        file: String,
        #[source]
        source: RenameError,
    },

    #[error("git commit o push falló para {file}: {source}")]
    Commit {
        file: String,
        #[source]
        source: anyhow::Error,
    },
}
