//! HTTP adapters: reachability probe and discovery client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use mf_shared_types::MicrofrontendRecord;

use crate::domain::RegistryError;
use crate::ports::{DiscoverySource, HealthOutcome, HealthProbe};

/// Probes remote entries with a `HEAD` request.
pub struct HttpHealthProbe {
    client: Client,
}

impl HttpHealthProbe {
    /// Create a probe.
    pub fn new() -> Result<Self, RegistryError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| RegistryError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &str, timeout: Duration) -> HealthOutcome {
        match self.client.head(url).timeout(timeout).send().await {
            Ok(response) if response.status().is_success() || response.status().is_redirection() => {
                HealthOutcome::Healthy
            }
            Ok(response) => HealthOutcome::Unhealthy(format!("HTTP {}", response.status())),
            Err(e) if e.is_timeout() => HealthOutcome::TimedOut,
            Err(e) => HealthOutcome::Unhealthy(e.to_string()),
        }
    }
}

/// Fetches `GET <service_url>/microfrontends` with a bearer credential.
pub struct HttpDiscoveryClient {
    client: Client,
    endpoint: String,
}

impl HttpDiscoveryClient {
    /// Create a client for `service_url`.
    pub fn new(
        service_url: &str,
        auth_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| RegistryError::HttpClient(format!("invalid token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| RegistryError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: discovery_endpoint(service_url),
        })
    }

    /// Fully-qualified endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn discovery_endpoint(service_url: &str) -> String {
    format!("{}/microfrontends", service_url.trim_end_matches('/'))
}

#[async_trait]
impl DiscoverySource for HttpDiscoveryClient {
    async fn fetch(&self) -> Result<Vec<MicrofrontendRecord>, RegistryError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RegistryError::DiscoveryFetchFailed(e.to_string()))?;

        let records: Vec<MicrofrontendRecord> = response
            .json()
            .await
            .map_err(|e| RegistryError::DiscoveryFetchFailed(format!("decode: {e}")))?;
        debug!(endpoint = %self.endpoint, count = records.len(), "Discovery fetched");
        Ok(records)
    }
}
