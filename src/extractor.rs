//! Cliente del servicio de extracción asíncrona de documentos (MinerU).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{TaskHandle, TaskState, TaskStatus},
};

/// Operaciones que el flujo necesita de un servicio de extracción.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Envía la URL de una imagen y devuelve el identificador de la tarea.
    async fn submit(&self, source_url: &str) -> Result<TaskHandle, ApiError>;

    /// Consulta una vez el estado de la tarea.
    async fn fetch_status(&self, handle: &TaskHandle) -> Result<TaskStatus, ApiError>;
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    url: &'a str,
    is_ocr: bool,
    enable_formula: bool,
    enable_table: bool,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    state: Option<String>,
    full_zip_url: Option<String>,
    err_msg: Option<String>,
}

/// Cliente HTTP de la API v4 de MinerU.
#[derive(Debug, Clone)]
pub struct MineruClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl MineruClient {
    pub fn new(client: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    pub fn from_config(client: Client, cfg: &AppConfig) -> Self {
        Self::new(client, cfg.mineru_endpoint.clone(), cfg.mineru_token.clone())
    }

    fn task_url(&self) -> String {
        format!("{}/api/v4/extract/task", self.endpoint)
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ExtractionService for MineruClient {
    async fn submit(&self, source_url: &str) -> Result<TaskHandle, ApiError> {
        // OCR y tablas activados, fórmulas desactivadas.
        let body = SubmitRequest {
            url: source_url,
            is_ocr: true,
            enable_formula: false,
            enable_table: true,
        };

        debug!(url = %source_url, "Creando tarea de extracción en MinerU");
        let response = self
            .client
            .post(self.task_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let envelope: Envelope<SubmitData> = Self::read_json(response).await?;
        let task_id = envelope
            .data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                if let Some(msg) = &envelope.msg {
                    info!("MinerU no devolvió task_id: {msg}");
                }
                ApiError::MissingField("data.task_id")
            })?;

        info!(%task_id, "Tarea de extracción creada");
        Ok(TaskHandle { task_id })
    }

    async fn fetch_status(&self, handle: &TaskHandle) -> Result<TaskStatus, ApiError> {
        let response = self
            .client
            .get(format!("{}/{}", self.task_url(), handle.task_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let envelope: Envelope<StatusData> = Self::read_json(response).await?;
        let data = envelope.data.ok_or(ApiError::MissingField("data"))?;

        Ok(TaskStatus {
            state: TaskState::from_wire(data.state.as_deref()),
            full_zip_url: data.full_zip_url.filter(|u| !u.is_empty()),
            err_msg: data.err_msg.filter(|m| !m.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::MockServer;
    use serde_json::json;

    fn client_for(server: &MockServer) -> MineruClient {
        MineruClient::new(Client::new(), server.base_url(), "mineru-token")
    }

    #[tokio::test]
    async fn submit_posts_fixed_options_and_reads_task_id() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/extract/task")
                .header("authorization", "Bearer mineru-token")
                .json_body(json!({
                    "url": "https://raw.example/a%20b.png",
                    "is_ocr": true,
                    "enable_formula": false,
                    "enable_table": true
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"code": 0, "msg": "ok", "data": {"task_id": "abc-123"}}));
        });

        let handle = client_for(&server)
            .submit("https://raw.example/a%20b.png")
            .await
            .expect("submit should succeed");

        mock.assert();
        assert_eq!(handle.task_id, "abc-123");
    }

    #[tokio::test]
    async fn submit_without_task_id_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v4/extract/task");
            then.status(200)
                .json_body(json!({"code": -1, "msg": "quota exceeded", "data": null}));
        });

        let err = client_for(&server)
            .submit("https://raw.example/x.png")
            .await
            .expect_err("missing task id must fail");
        assert!(matches!(err, ApiError::MissingField("data.task_id")));
    }

    #[tokio::test]
    async fn submit_surfaces_http_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v4/extract/task");
            then.status(401).body("unauthorized");
        });

        let err = client_for(&server)
            .submit("https://raw.example/x.png")
            .await
            .expect_err("401 must fail");
        assert!(
            matches!(err, ApiError::Status { status, ref body } if status.as_u16() == 401 && body == "unauthorized")
        );
    }

    #[tokio::test]
    async fn submit_rejects_malformed_json() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v4/extract/task");
            then.status(200).body("<html>not json</html>");
        });

        let err = client_for(&server)
            .submit("https://raw.example/x.png")
            .await
            .expect_err("html must fail");
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn fetch_status_maps_done_state() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/extract/task/abc-123")
                .header("authorization", "Bearer mineru-token");
            then.status(200).json_body(json!({
                "data": {"state": "done", "full_zip_url": "https://cdn.example/abc.zip", "err_msg": ""}
            }));
        });

        let status = client_for(&server)
            .fetch_status(&TaskHandle {
                task_id: "abc-123".to_string(),
            })
            .await
            .expect("status should decode");

        mock.assert();
        assert_eq!(status.state, TaskState::Done);
        assert_eq!(
            status.full_zip_url.as_deref(),
            Some("https://cdn.example/abc.zip")
        );
        assert!(status.err_msg.is_none());
    }

    #[tokio::test]
    async fn fetch_status_keeps_intermediate_states() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/extract/task/t-9");
            then.status(200)
                .json_body(json!({"data": {"state": "running"}}));
        });

        let status = client_for(&server)
            .fetch_status(&TaskHandle {
                task_id: "t-9".to_string(),
            })
            .await
            .expect("status should decode");
        assert_eq!(status.state, TaskState::Pending("running".to_string()));
    }

    #[tokio::test]
    async fn fetch_status_without_data_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/extract/task/t-9");
            then.status(200).json_body(json!({"code": 0}));
        });

        let err = client_for(&server)
            .fetch_status(&TaskHandle {
                task_id: "t-9".to_string(),
            })
            .await
            .expect_err("missing data must fail");
        assert!(matches!(err, ApiError::MissingField("data")));
    }
}
