//! trace.moe anime-scene lookup client.
//!
//! `GET https://api.trace.moe/search?anilistInfo&url={image_url}` returns a
//! ranked list of scene matches.

use std::time::Duration;

use anyhow::{bail, Result};
use serde::Deserialize;
use tracing::debug;

const SEARCH_URL: &str = "https://api.trace.moe/search";

#[derive(Clone)]
pub struct TraceMoe {
    client: reqwest::Client,
}

/// One scene match, flattened for display.
#[derive(Clone, Debug)]
pub struct SceneMatch {
    pub title: String,
    pub episode: Option<u32>,
    /// Seconds into the episode.
    pub at: f64,
    /// 0.0 to 1.0.
    pub similarity: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    error: Option<String>,
    #[serde(default)]
    result: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    anilist: Option<Anilist>,
    filename: Option<String>,
    episode: Option<serde_json::Value>,
    from: f64,
    similarity: f64,
}

#[derive(Debug, Deserialize)]
struct Anilist {
    title: Option<AnilistTitle>,
}

#[derive(Debug, Deserialize)]
struct AnilistTitle {
    romaji: Option<String>,
    english: Option<String>,
}

impl TraceMoe {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");

        Self { client }
    }

    /// Look up the best scene match for an image URL.
    pub async fn search(&self, image_url: &str) -> Result<Option<SceneMatch>> {
        debug!("trace.moe lookup for {}", image_url);

        let response: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[("anilistInfo", ""), ("url", image_url)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            bail!("trace.moe error: {}", error);
        }

        let Some(best) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let title = best
            .anilist
            .and_then(|a| a.title)
            .and_then(|t| t.english.or(t.romaji))
            .or(best.filename)
            .unwrap_or_else(|| "Unknown".to_string());

        // The API reports episode as a number, string or null
        let episode = match best.episode {
            Some(serde_json::Value::Number(n)) => n.as_u64().map(|e| e as u32),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        };

        Ok(Some(SceneMatch {
            title,
            episode,
            at: best.from,
            similarity: best.similarity,
        }))
    }
}

impl Default for TraceMoe {
    fn default() -> Self {
        Self::new()
    }
}
