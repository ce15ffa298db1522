//! HTTP client for the upstream service.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::UpstreamConfig;
use crate::upstream::{RemoteOperation, UpstreamError, UpstreamResponse};

/// Calls `GET {base_url}{path}` on the configured upstream.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    url: Url,
}

impl HttpUpstream {
    /// Build a client for the configured upstream.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base = Url::parse(&config.base_url())
            .map_err(|e| UpstreamError::Connection(format!("invalid upstream url: {e}")))?;
        let url = base
            .join(&config.path)
            .map_err(|e| UpstreamError::Connection(format!("invalid upstream path: {e}")))?;

        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl RemoteOperation for HttpUpstream {
    async fn call(&self, deadline: Duration) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .get(self.url.clone())
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| classify(e, deadline))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %self.url, status = %status, "Upstream returned non-success status");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let text = response.text().await.map_err(|e| classify(e, deadline))?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        Ok(UpstreamResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify(err: reqwest::Error, deadline: Duration) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout(deadline)
    } else {
        UpstreamError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_from_config() {
        let upstream = HttpUpstream::new(&UpstreamConfig {
            host: "127.0.0.1".into(),
            port: 4555,
            path: "/data".into(),
            timeout_ms: 100,
        })
        .unwrap();

        assert_eq!(upstream.url().as_str(), "http://127.0.0.1:4555/data");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let upstream = HttpUpstream::new(&UpstreamConfig {
            port,
            ..Default::default()
        })
        .unwrap();

        let err = upstream.call(Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Connection(_)), "got {err:?}");
    }
}
