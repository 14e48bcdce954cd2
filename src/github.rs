//! Cliente mínimo de la API REST de GitHub: ficheros de un pull request y
//! releases donde se archivan los bundles de MinerU.

use reqwest::{header, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{config::AppConfig, error::ApiError};

const PER_PAGE: u32 = 100;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    pub upload_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestFile {
    filename: String,
}

#[derive(Debug, Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: String,
    draft: bool,
    prerelease: bool,
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
    repository: String,
    token: String,
}

impl GithubClient {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        repository: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            repository: repository.into(),
            token: token.into(),
        }
    }

    pub fn from_config(client: Client, cfg: &AppConfig) -> Self {
        Self::new(
            client,
            cfg.github_api_url.clone(),
            cfg.github_repository.clone(),
            cfg.github_token.clone(),
        )
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, USER_AGENT)
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

    /// Recorre las páginas de un listado hasta la primera incompleta.
    async fn list_all<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let response = self
                .authed(self.client.get(format!("{}{path}", self.api_url)))
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            let batch: Vec<T> = Self::read_json(response).await?;
            let last = batch.len() < PER_PAGE as usize;
            items.extend(batch);
            if last {
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Rutas de todos los ficheros tocados por un pull request.
    pub async fn list_pull_request_files(&self, number: u64) -> Result<Vec<String>, ApiError> {
        let files: Vec<PullRequestFile> = self
            .list_all(&format!("/repos/{}/pulls/{number}/files", self.repository))
            .await?;
        debug!(pr = number, files = files.len(), "Ficheros del pull request obtenidos");
        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    /// Busca una release cuyo título coincide exactamente con `name`.
    pub async fn find_release_by_name(&self, name: &str) -> Result<Option<Release>, ApiError> {
        let releases: Vec<Release> = self
            .list_all(&format!("/repos/{}/releases", self.repository))
            .await?;
        Ok(releases
            .into_iter()
            .find(|r| r.name.as_deref() == Some(name)))
    }

    pub async fn create_release(&self, tag: &str) -> Result<Release, ApiError> {
        let body = CreateRelease {
            tag_name: tag,
            name: tag,
            body: format!("Release {tag}"),
            draft: false,
            prerelease: false,
        };
        let response = self
            .authed(
                self.client
                    .post(format!("{}/repos/{}/releases", self.api_url, self.repository)),
            )
            .json(&body)
            .send()
            .await?;
        let release: Release = Self::read_json(response).await?;
        info!(tag, id = release.id, "Release creada");
        Ok(release)
    }

    /// Sube `data` como asset de la release.
    pub async fn upload_asset(
        &self,
        release: &Release,
        asset_name: &str,
        data: Vec<u8>,
    ) -> Result<ReleaseAsset, ApiError> {
        // upload_url llega como plantilla: ".../assets{?name,label}"
        let upload_url = release
            .upload_url
            .split('{')
            .next()
            .unwrap_or(&release.upload_url);
        let response = self
            .authed(self.client.post(upload_url))
            .query(&[("name", asset_name)])
            .header(header::CONTENT_TYPE, "application/zip")
            .body(data)
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Archiva el bundle en la release `tag`, creándola si no existe.
    pub async fn archive_bundle(
        &self,
        tag: &str,
        asset_name: &str,
        data: Vec<u8>,
    ) -> Result<ReleaseAsset, ApiError> {
        let release = match self.find_release_by_name(tag).await? {
            Some(release) => release,
            None => self.create_release(tag).await?,
        };
        let asset = self.upload_asset(&release, asset_name, data).await?;
        info!(
            asset_id = asset.id,
            "Subido {} a la release {}", asset.name, release.tag_name
        );
        Ok(asset)
    }
}
