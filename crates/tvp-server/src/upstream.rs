//! HTTP client for upstream manifest and segment fetches.
//!
//! Every fetch carries a bounded timeout; any transport failure or non-2xx
//! status becomes [`tvp_core::Error::Upstream`] tagged with the failing URL.

use reqwest::{header, Client, Response};
use tvp_core::config::UpstreamConfig;
use tvp_core::Error;

/// A manifest body together with the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct FetchedManifest {
    pub text: String,
    /// Final URL after redirects; segment bases are derived from this.
    pub source_url: String,
}

/// Shared upstream client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build upstream HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Fetch a manifest as text.
    pub async fn fetch_manifest(&self, url: &str) -> tvp_core::Result<FetchedManifest> {
        let response = self
            .client
            .get(url)
            .timeout(self.config.manifest_timeout())
            .send()
            .await
            .map_err(|e| Error::upstream(url, e))?;

        let response = ensure_success(url, response)?;
        let source_url = response.url().to_string();
        let text = response.text().await.map_err(|e| Error::upstream(url, e))?;

        Ok(FetchedManifest { text, source_url })
    }

    /// Start a segment fetch, forwarding the client's `Range` header.
    ///
    /// The returned response has not been read; its body is meant to be
    /// streamed straight to the client.
    pub async fn fetch_segment(&self, url: &str, range: Option<&str>) -> tvp_core::Result<Response> {
        let mut request = self
            .client
            .get(url)
            .timeout(self.config.segment_timeout());

        if let Some(range) = range {
            request = request.header(header::RANGE, range);
        }

        let response = request.send().await.map_err(|e| Error::upstream(url, e))?;
        ensure_success(url, response)
    }
}

fn ensure_success(url: &str, response: Response) -> tvp_core::Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::upstream(url, format!("upstream returned {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> UpstreamClient {
        UpstreamClient::new(&UpstreamConfig::default())
    }

    #[tokio::test]
    async fn fetch_manifest_returns_text_and_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/index.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let url = format!("{}/live/index.m3u8", server.uri());
        let manifest = client().fetch_manifest(&url).await.unwrap();
        assert_eq!(manifest.text, "#EXTM3U\n");
        assert_eq!(manifest.source_url, url);
    }

    #[tokio::test]
    async fn fetch_manifest_non_success_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/live/index.m3u8", server.uri());
        let err = client().fetch_manifest(&url).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
        assert_eq!(err.http_status(), 502);
    }

    #[tokio::test]
    async fn fetch_manifest_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("#EXTM3U\n")
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = UpstreamConfig {
            manifest_timeout_secs: 1,
            ..UpstreamConfig::default()
        };
        let url = format!("{}/slow.m3u8", server.uri());
        let err = UpstreamClient::new(&config)
            .fetch_manifest(&url)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }

    #[tokio::test]
    async fn fetch_segment_forwards_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/7.ts"))
            .and(header_eq("range", "bytes=0-99"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(vec![0u8; 100]))
            .mount(&server)
            .await;

        let url = format!("{}/live/7.ts", server.uri());
        let response = client()
            .fetch_segment(&url, Some("bytes=0-99"))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 206);
    }

    #[tokio::test]
    async fn fetch_segment_unreachable_is_upstream_error() {
        let err = client()
            .fetch_segment("http://127.0.0.1:1/live/7.ts", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }
}
