//! HTTP script transport.
//!
//! Fetches remote entries over HTTP(S) and hands the source to a
//! [`ScriptEvaluator`], the host's execution engine, which registers the
//! containers the entry defines.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::{ContainerScope, LoadError};
use crate::ports::ScriptTransport;

/// Executes fetched remote-entry source.
#[async_trait]
pub trait ScriptEvaluator: Send + Sync {
    /// Run `source` (fetched from `url`), registering containers in `scope`.
    async fn evaluate(&self, url: &str, source: &str, scope: &ContainerScope)
        -> Result<(), String>;
}

/// Remote-entry transport over `reqwest`.
pub struct HttpScriptTransport {
    client: Client,
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl HttpScriptTransport {
    /// Create a transport whose requests give up after `request_timeout`.
    pub fn new(
        evaluator: Arc<dyn ScriptEvaluator>,
        request_timeout: Duration,
    ) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(Duration::from_secs(2)))
            .build()
            .map_err(|e| LoadError::InvalidConfig(e.to_string()))?;
        Ok(Self { client, evaluator })
    }

    fn failed(url: &str, reason: impl Into<String>) -> LoadError {
        LoadError::RemoteScriptLoadFailed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ScriptTransport for HttpScriptTransport {
    async fn load_script(&self, url: &str, scope: &ContainerScope) -> Result<(), LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Self::failed(url, e.to_string()))?;

        let source = response
            .text()
            .await
            .map_err(|e| Self::failed(url, e.to_string()))?;
        debug!(url, bytes = source.len(), "Fetched remote entry");

        self.evaluator
            .evaluate(url, &source, scope)
            .await
            .map_err(|reason| Self::failed(url, reason))
    }
}
