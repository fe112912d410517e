//! Provider that mirrors a remote XMLTV guide into the data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tvp_core::config::ProviderConfig;
use tvp_core::Error;

use super::{EpgProvider, EPG_FILE_NAME};

/// Upper bound for a single guide download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads `epg_url` to `{data_dir}/{name}/epg.xml`.
pub struct XmltvProvider {
    name: String,
    epg_url: String,
    dir: PathBuf,
    client: Client,
}

impl XmltvProvider {
    pub fn new(config: &ProviderConfig, data_dir: &Path) -> Self {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            name: config.name.clone(),
            epg_url: config.epg_url.clone(),
            dir: data_dir.join(&config.name),
            client,
        }
    }

    /// Where the generated guide is written.
    pub fn epg_path(&self) -> PathBuf {
        self.dir.join(EPG_FILE_NAME)
    }

    async fn download(&self) -> tvp_core::Result<bytes::Bytes> {
        let response = self
            .client
            .get(&self.epg_url)
            .send()
            .await
            .map_err(|e| Error::upstream(&self.epg_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                &self.epg_url,
                format!("upstream returned {status}"),
            ));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::upstream(&self.epg_url, e))
    }
}

#[async_trait]
impl EpgProvider for XmltvProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_epg(&self) -> tvp_core::Result<()> {
        let body = self
            .download()
            .await
            .map_err(|e| Error::provider(&self.name, e))?;

        tokio::fs::create_dir_all(&self.dir).await?;

        // Write-then-rename so readers never see a half-written guide.
        let target = self.epg_path();
        let partial = self.dir.join(format!("{EPG_FILE_NAME}.partial"));
        tokio::fs::write(&partial, &body).await?;
        tokio::fs::rename(&partial, &target).await?;

        tracing::info!(
            provider = %self.name,
            bytes = body.len(),
            path = %target.display(),
            "EPG written"
        );
        Ok(())
    }

    async fn rebuild_epg(&self) -> tvp_core::Result<()> {
        match tokio::fs::remove_file(self.epg_path()).await {
            Ok(()) => {
                tracing::info!(provider = %self.name, "Discarded generated EPG");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GUIDE: &str = r#"<?xml version="1.0"?><tv><channel id="news"/></tv>"#;

    fn provider(server_uri: &str, data_dir: &Path) -> XmltvProvider {
        let config = ProviderConfig {
            name: "plex".into(),
            epg_url: format!("{server_uri}/guide.xml"),
            refresh_interval_secs: Some(600),
        };
        XmltvProvider::new(&config, data_dir)
    }

    #[tokio::test]
    async fn generate_writes_guide() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guide.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(GUIDE))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&server.uri(), dir.path());

        provider.generate_epg().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("plex").join("epg.xml")).unwrap();
        assert_eq!(written, GUIDE);
        assert!(!dir.path().join("plex").join("epg.xml.partial").exists());
    }

    #[tokio::test]
    async fn generate_fails_on_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&server.uri(), dir.path());

        let err = provider.generate_epg().await.unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(!provider.epg_path().exists());
    }

    #[tokio::test]
    async fn rebuild_removes_guide() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider("http://127.0.0.1:1", dir.path());
        std::fs::create_dir_all(dir.path().join("plex")).unwrap();
        std::fs::write(provider.epg_path(), GUIDE).unwrap();

        provider.rebuild_epg().await.unwrap();
        assert!(!provider.epg_path().exists());

        // Nothing left to remove is not an error.
        provider.rebuild_epg().await.unwrap();
    }
}
