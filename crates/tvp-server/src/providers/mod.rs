//! EPG content providers.
//!
//! The scheduler only knows providers through the [`EpgProvider`] trait; how a
//! provider authenticates and builds its guide is its own business.

mod xmltv;

pub use xmltv::XmltvProvider;

use async_trait::async_trait;

/// File name every provider writes its generated guide to.
pub const EPG_FILE_NAME: &str = "epg.xml";

/// A source of Electronic Program Guide data.
///
/// Implementations are shared between the HTTP handlers and the provider's
/// scheduler task, so they must be `Send + Sync` and are held behind an `Arc`.
#[async_trait]
pub trait EpgProvider: Send + Sync {
    /// Short, lowercase identifier used in URLs (e.g. `"plex"`).
    fn name(&self) -> &str;

    /// Produce or update the provider's guide data.
    async fn generate_epg(&self) -> tvp_core::Result<()>;

    /// Discard previously generated data so the next generation starts fresh.
    async fn rebuild_epg(&self) -> tvp_core::Result<()>;
}
