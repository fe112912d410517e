//! Per-provider EPG refresh scheduling.
//!
//! Every configured provider gets a [`SchedulerUnit`]: a long-lived task that
//! refreshes the provider's guide on a cadence and on demand. A supervisor
//! restarts units that die; [`SchedulerHub`] is the handle the HTTP layer uses
//! to reach them.

mod runner;
mod status;
mod supervisor;
mod trigger;

#[cfg(test)]
pub(crate) mod test_support;

use std::time::Duration;

use tvp_core::config::SchedulerConfig;

pub use runner::{run_unit, SchedulerUnit, UnitExit};
pub use status::{SchedulerState, SchedulerStatus, StatusCell};
pub use supervisor::SchedulerHub;
pub use trigger::RefreshTrigger;

/// Scheduler timings, resolved from [`SchedulerConfig`].
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub tick: Duration,
    pub init_retry: Duration,
    pub supervisor_poll: Duration,
    pub max_consecutive_faults: u32,
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            tick: Duration::from_millis(config.tick_millis.max(1)),
            init_retry: Duration::from_secs(config.init_retry_secs),
            supervisor_poll: Duration::from_secs(config.supervisor_poll_secs.max(1)),
            max_consecutive_faults: config.max_consecutive_faults,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}
