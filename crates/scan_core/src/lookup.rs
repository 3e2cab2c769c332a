use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{ItemId, ItemRecord},
    error::LookupError,
    protocol::{decode_item_rows, LookupQuery},
};
use tracing::{debug, info};

use crate::config::LookupSettings;

/// Remote source of item records, keyed by scanned id.
#[async_trait]
pub trait ItemLookup: Send + Sync {
    /// Returns the service's matches in the order it sent them.
    async fn lookup(&self, item_id: ItemId) -> Result<Vec<ItemRecord>, LookupError>;
}

pub struct HttpItemLookup {
    http: Client,
    lookup_url: String,
    api_key: String,
    user_id: String,
    user_secret: String,
}

impl HttpItemLookup {
    pub fn new(settings: &LookupSettings) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LookupError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(http, settings))
    }

    pub fn with_client(http: Client, settings: &LookupSettings) -> Self {
        Self {
            http,
            lookup_url: settings.lookup_url.clone(),
            api_key: settings.api_key.clone(),
            user_id: settings.user_id.clone(),
            user_secret: settings.user_secret.clone(),
        }
    }

    fn query_for(&self, item_id: ItemId) -> LookupQuery {
        LookupQuery::for_item(&self.api_key, &self.user_id, &self.user_secret, item_id)
    }
}

#[async_trait]
impl ItemLookup for HttpItemLookup {
    async fn lookup(&self, item_id: ItemId) -> Result<Vec<ItemRecord>, LookupError> {
        info!(
            url = %self.lookup_url,
            api_key = %self.api_key,
            uid = %self.user_id,
            item_id = item_id.0,
            "fetching item details"
        );

        let response = self
            .http
            .get(&self.lookup_url)
            .query(&self.query_for(item_id))
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Transport(format!("failed to read response body: {e}")))?;

        let records = decode_item_rows(&body)?;
        debug!(item_id = item_id.0, matches = records.len(), "lookup response decoded");
        Ok(records)
    }
}

#[cfg(test)]
#[path = "tests/lookup_tests.rs"]
mod tests;
