//! Observable scheduler state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Lifecycle state of a provider's scheduler unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Running the first refresh; retried until it succeeds.
    Initializing,
    /// Steady-state loop.
    Running,
    /// Servicing a manual trigger.
    ManualRefresh,
    /// The unit gave up; waiting for its supervisor to restart it.
    Dead,
}

/// Point-in-time view of one provider's scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub provider: String,
    pub state: SchedulerState,
    /// Number of units the supervisor has started (1 for the first).
    pub generation: u64,
    /// Successful refreshes across all generations.
    pub refreshes: u64,
    /// Failed or panicked refreshes across all generations.
    pub failures: u64,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Shared, lock-guarded [`SchedulerStatus`].
#[derive(Debug, Clone)]
pub struct StatusCell(Arc<RwLock<SchedulerStatus>>);

impl StatusCell {
    pub fn new(provider: &str) -> Self {
        Self(Arc::new(RwLock::new(SchedulerStatus {
            provider: provider.to_string(),
            state: SchedulerState::Initializing,
            generation: 0,
            refreshes: 0,
            failures: 0,
            last_refresh: None,
            last_error: None,
        })))
    }

    pub fn snapshot(&self) -> SchedulerStatus {
        self.0.read().clone()
    }

    pub fn state(&self) -> SchedulerState {
        self.0.read().state
    }

    pub(crate) fn set_state(&self, state: SchedulerState) {
        self.0.write().state = state;
    }

    /// Mark the start of a new unit; returns its generation number.
    pub(crate) fn begin_generation(&self) -> u64 {
        let mut status = self.0.write();
        status.generation += 1;
        status.state = SchedulerState::Initializing;
        status.generation
    }

    pub(crate) fn record_success(&self) {
        let mut status = self.0.write();
        status.refreshes += 1;
        status.last_refresh = Some(Utc::now());
    }

    pub(crate) fn record_failure(&self, error: String) {
        let mut status = self.0.write();
        status.failures += 1;
        status.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_reset_state() {
        let cell = StatusCell::new("plex");
        assert_eq!(cell.begin_generation(), 1);
        cell.set_state(SchedulerState::Dead);
        assert_eq!(cell.begin_generation(), 2);
        assert_eq!(cell.state(), SchedulerState::Initializing);
    }

    #[test]
    fn records_refresh_outcomes() {
        let cell = StatusCell::new("plex");
        cell.record_success();
        cell.record_failure("boom".into());

        let status = cell.snapshot();
        assert_eq!(status.refreshes, 1);
        assert_eq!(status.failures, 1);
        assert!(status.last_refresh.is_some());
        assert_eq!(status.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&SchedulerState::ManualRefresh).unwrap();
        assert_eq!(json, "\"manual_refresh\"");
    }
}
