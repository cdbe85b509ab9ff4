//! Design API client.
//!
//! Network and auth failures here are soft: they are logged and surface as
//! `None`, so a broken connection degrades one asset or one document fetch
//! instead of crashing the run.

use serde_json::Value;
use tracing::warn;

use crate::document::DesignFile;

const DEFAULT_BASE_URL: &str = "https://api.figma.com/v1";
const TOKEN_HEADER: &str = "X-Figma-Token";

pub struct FigmaApi {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl FigmaApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        FigmaApi {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    async fn get_json(&self, url: &str) -> Option<Value> {
        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match response {
            Ok(resp) => match resp.json::<Value>().await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("malformed design api payload from {url}: {e}");
                    None
                }
            },
            Err(e) => {
                warn!("design api request {url} failed: {e}");
                None
            }
        }
    }

    /// Fetch the whole design document tree.
    pub async fn fetch_file(&self, fig_file: &str) -> Option<DesignFile> {
        let url = format!("{}/files/{}", self.base_url, fig_file);
        let value = self.get_json(&url).await?;
        match serde_json::from_value(value) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("design file {fig_file} did not match the expected shape: {e}");
                None
            }
        }
    }

    /// Resolve the download URL for one asset. A node id selects the render
    /// endpoint; without one the bulk file-images index is consulted by
    /// content reference.
    pub async fn image_url(
        &self,
        fig_file: &str,
        node_id: Option<&str>,
        image_ref: &str,
        format: Option<&str>,
    ) -> Option<String> {
        if let Some(node_id) = node_id {
            let url = format!(
                "{}/images/{}?format={}&ids={}",
                self.base_url,
                fig_file,
                format.unwrap_or("png"),
                node_id
            );
            let value = self.get_json(&url).await?;
            return value
                .get("images")
                .and_then(|images| images.get(node_id))
                .and_then(|u| u.as_str())
                .map(|u| u.to_string());
        }

        let url = format!("{}/files/{}/images", self.base_url, fig_file);
        let value = self.get_json(&url).await?;
        value
            .get("meta")
            .and_then(|meta| meta.get("images"))
            .and_then(|images| images.get(image_ref))
            .and_then(|u| u.as_str())
            .map(|u| u.to_string())
    }

    /// Download asset bytes, inferring the file extension from the response
    /// content type (`image/svg+xml` -> `svg`).
    pub async fn download(&self, url: &str) -> Option<(Vec<u8>, String)> {
        let response = self.client.get(url).send().await.and_then(|r| r.error_for_status());
        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("asset download {url} failed: {e}");
                return None;
            }
        };
        let extension = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split('/').nth(1))
            .map(|sub| sub.split('+').next().unwrap_or("png").to_string())
            .unwrap_or_else(|| "png".to_string());
        match response.bytes().await {
            Ok(bytes) => Some((bytes.to_vec(), extension)),
            Err(e) => {
                warn!("asset download {url} was interrupted: {e}");
                None
            }
        }
    }
}
