//! Modelos de dominio (tareas de extracción y operaciones de renombrado).

use std::fmt;

/// Estado de una tarea de extracción tal y como lo reporta el servicio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Done,
    Failed,
    /// Cualquier otro valor (`pending`, `running`, `converting`...).
    Pending(String),
}

impl TaskState {
    pub fn from_wire(state: Option<&str>) -> Self {
        match state {
            Some("done") => Self::Done,
            Some("failed") => Self::Failed,
            Some(other) => Self::Pending(other.to_string()),
            None => Self::Pending("desconocido".to_string()),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => f.write_str("done"),
            Self::Failed => f.write_str("failed"),
            Self::Pending(state) => f.write_str(state),
        }
    }
}

/// Instantánea de una tarea de extracción devuelta por una consulta de estado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub state: TaskState,
    pub full_zip_url: Option<String>,
    pub err_msg: Option<String>,
}

/// Identificador de una tarea enviada al servicio de extracción.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: String,
}

/// Las dos URLs con las que se trabaja por cada imagen modificada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    /// URL `raw` (percent-encoded) que se envía al servicio de extracción.
    pub raw_url: String,
    /// URL web (`.../blob/<rama>/<ruta>`) de la que se deriva la ruta local.
    pub web_url: String,
}

/// Un renombrado ya aplicado sobre la copia de trabajo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOp {
    pub old_path: String,
    pub new_path: String,
}

impl fmt::Display for RenameOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.old_path, self.new_path)
    }
}
