//! Shared HTTP plumbing for provider adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{SourceError, SourceResult};

/// Thin wrapper over a `reqwest` client with a fixed per-request timeout.
#[derive(Clone)]
pub struct ProviderHttp {
    client: Client,
    provider: &'static str,
}

impl ProviderHttp {
    pub fn new(provider: &'static str, timeout: Duration) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trend-poster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::Network)?;

        Ok(Self { client, provider })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request and decode a JSON body, translating failures.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SourceResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(provider = self.provider, status = status.as_u16(), "Provider request failed");
            return Err(SourceError::from_http_status(
                self.provider,
                status.as_u16(),
                message,
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::from_reqwest(self.provider, e))?;
        Ok(serde_json::from_slice(&body)?)
    }
}
