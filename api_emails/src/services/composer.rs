use async_trait::async_trait;
use common::{
    env_config::ComposerConfig,
    error::{AppError, Res},
};
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Text generation backend that writes the emails.
#[async_trait]
pub trait EmailComposer: Send + Sync {
    async fn compose(&self, prompt: &str) -> Res<String>;
}

#[derive(Debug, Serialize)]
struct ComposeRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ComposeResponse {
    text: String,
}

/// Composer reached over HTTP: `POST {url}/generate` with `{ "prompt": ... }`,
/// answered by `{ "text": ... }`.
pub struct ComposerClient {
    client: Client,
    url: String,
    api_key: String,
}

impl ComposerClient {
    pub fn new(config: &ComposerConfig) -> Self {
        ComposerClient {
            client: Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl EmailComposer for ComposerClient {
    async fn compose(&self, prompt: &str) -> Res<String> {
        let response = self
            .client
            .post(format!("{}/generate", self.url))
            .json(&ComposeRequest { prompt })
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Composer rejected request with {}: {}", status, body);
            return Err(AppError::Internal(format!(
                "Composer responded with status {}",
                status
            )));
        }

        let text = response.json::<ComposeResponse>().await?.text;
        if text.trim().is_empty() {
            return Err(AppError::Internal(
                "Failed to generate email content".to_string(),
            ));
        }

        info!("Composer returned {} characters", text.len());
        Ok(text)
    }
}
