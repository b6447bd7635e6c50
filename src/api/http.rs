use anyhow::Context;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::{
    api::{EntityKind, Source},
    app_error::{AppError, AppResult},
    config::SourceConfig,
};

/// Source backed by a dummyjson-style REST service: `GET {base}/{kind}`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    limit: Option<u32>,
}

impl HttpSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limit: config.limit,
        }
    }

    pub fn url_for(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base_url, kind.collection_key())
    }
}

impl Source for HttpSource {
    async fn fetch(&self, kind: EntityKind) -> AppResult<Value> {
        let url = self.url_for(kind);
        debug!(%url, "Fetching {kind}");

        let mut request = self.client.get(&url);
        if let Some(limit) = self.limit {
            request = request.query(&[("limit", limit)]);
        }

        let document: Value = request
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| AppError::ServiceUnreachable(format!("{url} ({err})")))?
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON from {url}"))?;

        Ok(document)
    }
}
