//! Operaciones de control de versiones delegadas en el binario `git`.

use std::{path::PathBuf, process::Stdio};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

#[async_trait]
pub trait Vcs: Send + Sync {
    /// Mueve un fichero versionado (`git mv`).
    async fn mv(&self, from: &str, to: &str) -> Result<()>;
    /// Añade todos los cambios del árbol de trabajo al índice.
    async fn add_all(&self) -> Result<()>;
    async fn commit(&self, message: &str) -> Result<()>;
    async fn push(&self) -> Result<()>;
}

/// Implementación sobre la línea de comandos de git.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        debug!(args = ?args, "Ejecutando git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("No se pudo ejecutar git {}", args.join(" ")))?;

        if !output.status.success() {
            return Err(anyhow!(
                "git {} terminó con {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn mv(&self, from: &str, to: &str) -> Result<()> {
        self.git(&["mv", "--", from, to]).await?;
        info!("Renombrado {from} -> {to}");
        Ok(())
    }

    async fn add_all(&self) -> Result<()> {
        self.git(&["add", "--all"]).await.map(|_| ())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.git(&["commit", "-m", message]).await.map(|_| ())
    }

    async fn push(&self) -> Result<()> {
        self.git(&["push"]).await.map(|_| ())
    }
}
