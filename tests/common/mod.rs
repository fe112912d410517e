//! Shared test harness for integration tests.
//!
//! [`TestHarness`] runs the full server (router plus EPG schedulers) on a
//! random local port with its data directory in a temp dir.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tvp_core::config::Config;
use tvp_server::context::AppContext;
use tvp_server::providers::EpgProvider;

pub struct TestHarness {
    pub ctx: AppContext,
    pub addr: SocketAddr,
    pub data_dir: TempDir,
    cancel: CancellationToken,
}

impl TestHarness {
    /// Default configuration, no providers.
    pub async fn start() -> Self {
        Self::start_with_config(Config::default()).await
    }

    /// Run with `config`; `data_dir` is replaced by a fresh temp dir and the
    /// scheduler timings are shortened.
    pub async fn start_with_config(config: Config) -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = fast_config(config, &data_dir);
        Self::serve(AppContext::new(config), data_dir).await
    }

    /// Run with explicit providers instead of the configured ones.
    pub async fn start_with_providers(providers: Vec<(Arc<dyn EpgProvider>, Duration)>) -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = fast_config(Config::default(), &data_dir);
        Self::serve(AppContext::with_providers(config, providers), data_dir).await
    }

    async fn serve(ctx: AppContext, data_dir: TempDir) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");
        let cancel = CancellationToken::new();

        tokio::spawn(tvp_server::serve(listener, ctx.clone(), cancel.clone()));

        Self {
            ctx,
            addr,
            data_dir,
            cancel,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Client that does not follow redirects.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build client")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client()
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    pub async fn register(&self, json: serde_json::Value) -> reqwest::Response {
        self.client()
            .post(self.url("/register"))
            .json(&json)
            .send()
            .await
            .expect("request failed")
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn fast_config(mut config: Config, data_dir: &TempDir) -> Config {
    config.data_dir = data_dir.path().to_path_buf();
    config.scheduler.tick_millis = 10;
    config.scheduler.init_retry_secs = 1;
    config.scheduler.supervisor_poll_secs = 1;
    config
}

/// Poll `condition` until it holds or ten seconds pass.
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
