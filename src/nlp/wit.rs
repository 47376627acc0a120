//! Wit.ai entity extraction client

use super::{EntityExtractor, EntityMap, NlpError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.wit.ai/message";

/// API version pinned so the response keeps the `entities` map shape
const API_VERSION: &str = "20180101";

pub struct WitClient {
    client: Client,
    token: String,
    base_url: String,
}

impl WitClient {
    pub fn new(token: String, base_url: Option<&str>) -> Result<Self, NlpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NlpError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).to_string(),
        })
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> NlpError {
        match status.as_u16() {
            401 | 403 => NlpError::auth(format!("Authentication failed: {body}")),
            429 => NlpError::rate_limit(format!("Rate limited: {body}")),
            500..=599 => NlpError::server_error(format!("Server error: {body}")),
            _ => NlpError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl EntityExtractor for WitClient {
    async fn extract(&self, text: &str) -> Result<EntityMap, NlpError> {
        let response = self
            .client
            .get(&self.base_url)
            .bearer_auth(&self.token)
            .query(&[("v", API_VERSION), ("q", text)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NlpError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    NlpError::network(format!("Connection failed: {e}"))
                } else {
                    NlpError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NlpError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        parse_response(&body)
    }

    fn name(&self) -> &str {
        "wit"
    }
}

#[derive(Debug, Deserialize)]
struct WitResponse {
    #[serde(default)]
    entities: EntityMap,
}

fn parse_response(body: &str) -> Result<EntityMap, NlpError> {
    let parsed: WitResponse = serde_json::from_str(body)
        .map_err(|e| NlpError::invalid_response(format!("Failed to parse response: {e}")))?;
    Ok(parsed.entities)
}
