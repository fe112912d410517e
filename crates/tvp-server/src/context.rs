//! Shared application state.
//!
//! [`AppContext`] is handed to every route handler through axum state. All
//! mutable state lives behind the `Arc`s, so cloning it is cheap.

use std::path::Path;
use std::sync::Arc;

use tvp_core::config::Config;

use crate::providers::{EpgProvider, XmltvProvider};
use crate::registry::{SegmentBaseCache, SlugRegistry};
use crate::scheduler::{SchedulerHub, SchedulerSettings};
use crate::upstream::UpstreamClient;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub registry: Arc<SlugRegistry>,
    pub segment_bases: Arc<SegmentBaseCache>,
    pub upstream: UpstreamClient,
    pub schedulers: Arc<SchedulerHub>,
}

impl AppContext {
    /// Build a context with one [`XmltvProvider`] per configured provider.
    pub fn new(config: Config) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|p| {
                let provider: Arc<dyn EpgProvider> =
                    Arc::new(XmltvProvider::new(p, &config.data_dir));
                (provider, p.cadence())
            })
            .collect();
        Self::with_providers(config, providers)
    }

    /// Build a context around an explicit provider set.
    pub fn with_providers(
        config: Config,
        providers: Vec<(Arc<dyn EpgProvider>, std::time::Duration)>,
    ) -> Self {
        let settings = SchedulerSettings::from(&config.scheduler);
        Self {
            upstream: UpstreamClient::new(&config.upstream),
            schedulers: Arc::new(SchedulerHub::new(providers, settings)),
            registry: Arc::new(SlugRegistry::new()),
            segment_bases: Arc::new(SegmentBaseCache::new()),
            config: Arc::new(config),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }
}
