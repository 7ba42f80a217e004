//! Fetching service history documents

use std::time::Duration;

use async_trait::async_trait;

use crate::controller::HistoryRequest;
use crate::{ServiceHistory, ViewerError};

/// Source of service history documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch the history described by `request`
    async fn fetch(&self, request: &HistoryRequest) -> crate::Result<ServiceHistory>;
}

/// Reads `service-history.json` over HTTP
#[derive(Debug, Clone)]
pub struct ReqwestHistorySource {
    client: reqwest::Client,
    endpoint: String,
}

impl ReqwestHistorySource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ViewerError::Http(format!("Building HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HistorySource for ReqwestHistorySource {
    async fn fetch(&self, request: &HistoryRequest) -> crate::Result<ServiceHistory> {
        let query = request.query_pairs();
        tracing::debug!("GET {} {:?}", self.endpoint, query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| ViewerError::Http(format!("GET {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::Http(format!(
                "GET {} returned {}",
                self.endpoint, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ViewerError::Http(format!("Reading response body: {}", e)))?;
        tracing::debug!("GET {} -> {} ({} bytes)", self.endpoint, status, body.len());

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Port 1 is reserved and unbound, so connections are always refused
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1/service-history.json";

    #[tokio::test]
    async fn connection_refused_returns_http_error() {
        let source = ReqwestHistorySource::new(UNREACHABLE_URL, Duration::from_secs(2)).unwrap();
        let request = HistoryRequest {
            service: "webshop".to_string(),
            from_tick: 0,
            to_tick: Some(11),
        };

        match source.fetch(&request).await.unwrap_err() {
            ViewerError::Http(msg) => {
                assert!(
                    msg.starts_with("GET http://127.0.0.1:1/service-history.json failed:"),
                    "{msg}"
                );
            }
            other => panic!("expected ViewerError::Http, got {other:?}"),
        }
    }

    #[test]
    fn keeps_endpoint() {
        let source =
            ReqwestHistorySource::new("http://ctf.local/service-history.json", Duration::from_secs(1))
                .unwrap();
        assert_eq!(source.endpoint(), "http://ctf.local/service-history.json");
    }
}
