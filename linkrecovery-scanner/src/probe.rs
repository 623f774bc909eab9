use crate::result::is_not_found;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub url: String,
    /// `None` when the request itself failed.
    pub status_code: Option<u16>,
}

impl ProbeOutcome {
    pub fn is_broken(&self) -> bool {
        self.status_code.map(is_not_found).unwrap_or(false)
    }
}

/// Fetch every URL with at most `concurrency` requests in flight.
/// Outcomes are returned in input order.
pub async fn probe_urls(client: &Client, urls: Vec<String>, concurrency: usize) -> Vec<ProbeOutcome> {
    stream::iter(urls)
        .map(|url| async move {
            match client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    debug!("Probe {} -> {}", url, status);
                    ProbeOutcome {
                        url,
                        status_code: Some(status),
                    }
                }
                Err(e) => {
                    warn!("Probe failed for {}: {}", url, e);
                    ProbeOutcome {
                        url,
                        status_code: None,
                    }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_probe_classifies_statuses() {
        let mock_server = MockServer::start().await;
        for (route, status) in [("/ok", 200), ("/missing", 404), ("/gone", 410), ("/error", 500)] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(status))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let urls: Vec<String> = ["/ok", "/missing", "/gone", "/error"]
            .iter()
            .map(|p| format!("{}{}", mock_server.uri(), p))
            .collect();

        let outcomes = probe_urls(&Client::new(), urls.clone(), 2).await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            outcomes.iter().map(|o| o.url.clone()).collect::<Vec<_>>(),
            urls
        );
        let broken: Vec<bool> = outcomes.iter().map(|o| o.is_broken()).collect();
        assert_eq!(broken, vec![false, true, true, false]);
    }

    #[tokio::test]
    async fn test_probe_failure_is_not_broken() {
        let outcomes = probe_urls(&Client::new(), vec!["http://127.0.0.1:1/x".into()], 4).await;
        assert_eq!(outcomes[0].status_code, None);
        assert!(!outcomes[0].is_broken());
    }
}
