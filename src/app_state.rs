use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::{
    bundle::BundleProcessor,
    config::AppConfig,
    extractor::{ExtractionService, MineruClient},
    github::GithubClient,
    llm::Summarizer,
    poll::{Sleeper, TokioSleeper},
    vcs::{GitCli, Vcs},
};

/// Colaboradores de una ejecución, construidos una sola vez al arrancar.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub extractor: Arc<dyn ExtractionService>,
    pub sleeper: Arc<dyn Sleeper>,
    pub bundles: BundleProcessor,
    pub summarizer: Summarizer,
    pub github: GithubClient,
    pub vcs: Arc<dyn Vcs>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("No se pudo construir el cliente HTTP")?;

        let github = GithubClient::from_config(http.clone(), &config);
        Ok(Self {
            extractor: Arc::new(MineruClient::from_config(http.clone(), &config)),
            sleeper: Arc::new(TokioSleeper),
            bundles: BundleProcessor::new(http.clone(), github.clone(), &config),
            summarizer: Summarizer::from_config(http, &config),
            github,
            vcs: Arc::new(GitCli::new(config.repo_workdir.clone())),
            config,
        })
    }
}
