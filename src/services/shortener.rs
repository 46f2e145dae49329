//! URL-shortener client.
//!
//! Talks to the common self-hosted shortener API shape:
//! `GET {base}/api?api={key}&url={long_url}` returning
//! `{"status": "success", "shortenedUrl": "..."}`.

use std::time::Duration;

use anyhow::{bail, Result};
use serde::Deserialize;
use tracing::debug;

#[derive(Clone)]
pub struct Shortener {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    status: String,
    #[serde(rename = "shortenedUrl")]
    shortened_url: Option<String>,
    message: Option<String>,
}

impl Shortener {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Shorten a URL, returning the short form.
    pub async fn shorten(&self, long_url: &str) -> Result<String> {
        let endpoint = format!("{}/api", self.base_url);
        debug!("Shortening URL via {}", endpoint);

        let response: ShortenResponse = self
            .client
            .get(&endpoint)
            .query(&[("api", self.api_key.as_str()), ("url", long_url)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "success" {
            bail!(
                "shortener returned {}: {}",
                response.status,
                response.message.unwrap_or_default()
            );
        }

        response
            .shortened_url
            .ok_or_else(|| anyhow::anyhow!("shortener response missing shortenedUrl"))
    }
}
