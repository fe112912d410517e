//! The per-provider refresh loop.
//!
//! A unit first refreshes once, retrying until that succeeds, then ticks:
//! every tick it runs a periodic refresh if the cadence has elapsed and a
//! manual refresh if the trigger is set. Refreshes run inline, so a provider
//! never has two in flight. Errors returned by the provider are logged and
//! swallowed; a panic while refreshing is a loop fault, and
//! `max_consecutive_faults` faults in a row end the unit.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::status::{SchedulerState, StatusCell};
use super::trigger::RefreshTrigger;
use super::SchedulerSettings;
use crate::providers::EpgProvider;

/// Everything one provider's scheduler needs. Shared by every generation of
/// the provider's unit.
pub struct SchedulerUnit {
    pub(crate) provider: Arc<dyn EpgProvider>,
    pub(crate) trigger: RefreshTrigger,
    pub(crate) status: StatusCell,
    pub(crate) cadence: Duration,
    pub(crate) settings: SchedulerSettings,
}

impl SchedulerUnit {
    pub fn new(
        provider: Arc<dyn EpgProvider>,
        cadence: Duration,
        settings: SchedulerSettings,
    ) -> Self {
        let status = StatusCell::new(provider.name());
        Self {
            provider,
            trigger: RefreshTrigger::new(),
            status,
            cadence,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn trigger(&self) -> &RefreshTrigger {
        &self.trigger
    }

    pub fn status(&self) -> &StatusCell {
        &self.status
    }
}

/// Why a unit stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitExit {
    /// Shutdown was requested.
    Cancelled,
    /// Too many consecutive loop faults.
    Faulted,
}

/// Result of a single refresh invocation.
#[derive(Debug)]
enum Refresh {
    Completed,
    Failed(String),
    Panicked(String),
}

/// Run one provider's scheduler until it faults out or `cancel` fires.
pub async fn run_unit(unit: Arc<SchedulerUnit>, cancel: CancellationToken) -> UnitExit {
    let name = unit.name().to_string();
    unit.status.set_state(SchedulerState::Initializing);
    tracing::info!(provider = %name, "Scheduler unit starting");

    loop {
        match refresh(&unit).await {
            Refresh::Completed => break,
            Refresh::Failed(e) | Refresh::Panicked(e) => {
                tracing::error!(
                    provider = %name,
                    error = %e,
                    retry_secs = unit.settings.init_retry.as_secs_f64(),
                    "Initial EPG refresh failed, retrying"
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(unit.settings.init_retry) => {}
            _ = cancel.cancelled() => return UnitExit::Cancelled,
        }
    }

    unit.status.set_state(SchedulerState::Running);

    let mut ticker = tokio::time::interval(unit.settings.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_periodic = Instant::now();
    let mut faults = 0u32;
    let max_faults = unit.settings.max_consecutive_faults.max(1);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {
                tracing::info!(provider = %name, "Scheduler unit stopping");
                return UnitExit::Cancelled;
            }
        }

        let mut faulted = false;

        if last_periodic.elapsed() >= unit.cadence {
            last_periodic = Instant::now();
            tracing::debug!(provider = %name, "Periodic EPG refresh due");
            faulted |= matches!(refresh(&unit).await, Refresh::Panicked(_));
        }

        if unit.trigger.take() {
            tracing::info!(provider = %name, "Manual EPG refresh triggered");
            unit.status.set_state(SchedulerState::ManualRefresh);
            faulted |= matches!(refresh(&unit).await, Refresh::Panicked(_));
            unit.status.set_state(SchedulerState::Running);
        }

        if !faulted {
            faults = 0;
            continue;
        }

        faults += 1;
        tracing::error!(
            provider = %name,
            faults,
            max_faults,
            "Fault in scheduler loop"
        );
        if faults >= max_faults {
            unit.status.set_state(SchedulerState::Dead);
            tracing::error!(provider = %name, "Scheduler unit giving up");
            return UnitExit::Faulted;
        }
    }
}

/// Invoke the provider's EPG generation, recording the outcome.
async fn refresh(unit: &SchedulerUnit) -> Refresh {
    let name = unit.name();
    tracing::info!(provider = %name, "Running EPG refresh");

    let outcome = match AssertUnwindSafe(unit.provider.generate_epg())
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Refresh::Completed,
        Ok(Err(e)) => Refresh::Failed(e.to_string()),
        Err(payload) => Refresh::Panicked(panic_message(payload.as_ref())),
    };

    match &outcome {
        Refresh::Completed => {
            unit.status.record_success();
            tracing::info!(provider = %name, "EPG refresh complete");
        }
        Refresh::Failed(e) => {
            unit.status.record_failure(e.clone());
            tracing::error!(provider = %name, error = %e, "EPG refresh failed");
        }
        Refresh::Panicked(e) => {
            unit.status.record_failure(e.clone());
            tracing::error!(provider = %name, panic = %e, "EPG refresh panicked");
        }
    }

    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
