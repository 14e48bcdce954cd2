//! Resumen de texto con Rig sobre un endpoint de chat-completion compatible con OpenAI.

use anyhow::Result;
use rig::agent::AgentBuilder;
use rig::completion::Prompt;
use rig::providers::openai;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::AppConfig;

// El formato del nombre final depende de este prompt: resumen muy corto y sin
// inventar nada que no esté en el texto.
const SUMMARY_PROMPT: &str = "请以简洁准确的方式总结以下内容，总结限制在15个字内，不需要添加任何内容中没有提及的信息，\
如果内容中没有提到某个事物，请不要虚构或猜测它是否存在: \n";

const MAX_TOKENS: u32 = 50;
const TEMPERATURE: f64 = 0.3;

/// Cliente de resumen: un agente de Rig por petición, sin preámbulo.
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: openai::Client,
    chat_model: String,
}

impl Summarizer {
    /// Construye el cliente OpenAI de Rig apuntando a `OPENAI_API_BASE` y
    /// reutilizando el cliente HTTP compartido.
    pub fn from_config(http: reqwest::Client, cfg: &AppConfig) -> Self {
        let client = openai::Client::builder(&cfg.llm_api_key)
            .base_url(&cfg.llm_api_base)
            .with_client(http)
            .build();
        Self {
            client,
            chat_model: cfg.llm_chat_model.clone(),
        }
    }

    /// Devuelve una etiqueta corta para `text`, o `None` si la llamada falla
    /// o el modelo no devuelve contenido.
    pub async fn summarize(&self, text: &str) -> Option<String> {
        match self.request_summary(text).await {
            Ok(summary) if !summary.is_empty() => Some(summary),
            Ok(_) => {
                warn!("El modelo devolvió un resumen vacío");
                None
            }
            Err(err) => {
                warn!("Error al llamar a la API de chat: {err}");
                None
            }
        }
    }

    async fn request_summary(&self, text: &str) -> Result<String> {
        // Trait para client.completion_model(...)
        use rig::client::CompletionClient as _;

        // El proxy por defecto sólo habla la API de chat-completions.
        let model = self
            .client
            .completion_model(&self.chat_model)
            .completions_api();

        // El proveedor OpenAI de Rig no envía `max_tokens` del agente; va en
        // los parámetros adicionales, que se mezclan en el cuerpo.
        let agent = AgentBuilder::new(model)
            .temperature(TEMPERATURE)
            .additional_params(json!({ "max_tokens": MAX_TOKENS }))
            .build();

        debug!(model = %self.chat_model, "Solicitando resumen al LLM");
        let answer = agent.prompt(format!("{SUMMARY_PROMPT}{text}")).await?;
        Ok(answer.trim().to_string())
    }
}
