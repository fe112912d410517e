//! Supervision of the per-provider scheduler units.
//!
//! Each provider gets one supervisor task that owns the provider's current
//! unit. It polls the unit every `supervisor_poll` and starts a fresh one,
//! sharing the same trigger and status, whenever the old one has finished.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tvp_core::Error;

use super::runner::{run_unit, SchedulerUnit, UnitExit};
use super::status::{SchedulerState, SchedulerStatus};
use super::SchedulerSettings;
use crate::providers::EpgProvider;

struct HubEntry {
    unit: Arc<SchedulerUnit>,
    /// Abort handle of the unit currently owned by the supervisor.
    current: Arc<Mutex<Option<AbortHandle>>>,
}

/// Registry of every provider's scheduler, keyed by provider name.
///
/// Built once at startup; the set of providers is fixed afterwards.
pub struct SchedulerHub {
    entries: HashMap<String, HubEntry>,
    settings: SchedulerSettings,
}

impl SchedulerHub {
    pub fn new(providers: Vec<(Arc<dyn EpgProvider>, Duration)>, settings: SchedulerSettings) -> Self {
        let entries = providers
            .into_iter()
            .map(|(provider, cadence)| {
                let unit = Arc::new(SchedulerUnit::new(provider, cadence, settings.clone()));
                let entry = HubEntry {
                    unit,
                    current: Arc::new(Mutex::new(None)),
                };
                (entry.unit.name().to_string(), entry)
            })
            .collect();

        Self { entries, settings }
    }

    /// Spawn one supervisor per provider. All of them, and the units they
    /// own, stop once `cancel` fires.
    pub fn start(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        self.entries
            .values()
            .map(|entry| {
                tokio::spawn(supervise(
                    entry.unit.clone(),
                    entry.current.clone(),
                    self.settings.supervisor_poll,
                    cancel.clone(),
                ))
            })
            .collect()
    }

    /// Ask `provider`'s scheduler for a refresh on its next tick.
    ///
    /// Returns immediately; the refresh itself runs inside the scheduler.
    pub fn trigger_refresh(&self, provider: &str) -> tvp_core::Result<()> {
        match self.entries.get(provider) {
            Some(entry) => {
                entry.unit.trigger().set();
                tracing::info!(provider = %provider, "Manual EPG refresh requested");
                Ok(())
            }
            None => {
                tracing::error!(provider = %provider, "No scheduler for provider");
                Err(Error::TriggerTargetMissing(provider.to_string()))
            }
        }
    }

    /// Whether a manual refresh is queued for `provider` and not yet picked up.
    pub fn refresh_pending(&self, provider: &str) -> Option<bool> {
        self.entries.get(provider).map(|e| e.unit.trigger().is_set())
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn EpgProvider>> {
        self.entries.get(name).map(|e| e.unit.provider.clone())
    }

    /// Status of every scheduler, sorted by provider name.
    pub fn statuses(&self) -> Vec<SchedulerStatus> {
        let mut statuses: Vec<SchedulerStatus> = self
            .entries
            .values()
            .map(|e| e.unit.status().snapshot())
            .collect();
        statuses.sort_by(|a, b| a.provider.cmp(&b.provider));
        statuses
    }

    pub fn status(&self, provider: &str) -> Option<SchedulerStatus> {
        self.entries.get(provider).map(|e| e.unit.status().snapshot())
    }

    /// Kill `provider`'s current unit as if it had died on its own. The
    /// supervisor restarts it on its next poll. Returns `false` if the
    /// provider is unknown or has no running unit.
    pub fn abort_unit(&self, provider: &str) -> bool {
        let Some(entry) = self.entries.get(provider) else {
            return false;
        };
        match entry.current.lock().take() {
            Some(handle) => {
                handle.abort();
                entry.unit.status().set_state(SchedulerState::Dead);
                tracing::warn!(provider = %provider, "Scheduler unit aborted");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

async fn supervise(
    unit: Arc<SchedulerUnit>,
    current: Arc<Mutex<Option<AbortHandle>>>,
    poll: Duration,
    cancel: CancellationToken,
) {
    let name = unit.name().to_string();

    loop {
        let generation = unit.status().begin_generation();
        let handle = tokio::spawn(run_unit(unit.clone(), cancel.clone()));
        *current.lock() = Some(handle.abort_handle());
        tracing::info!(provider = %name, generation, "Started scheduler unit");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(poll) => {
                    if handle.is_finished() {
                        break;
                    }
                }
                _ = cancel.cancelled() => {
                    let _ = handle.await;
                    current.lock().take();
                    tracing::info!(provider = %name, "Supervisor stopping");
                    return;
                }
            }
        }

        current.lock().take();
        match handle.await {
            Ok(UnitExit::Faulted) => {
                tracing::warn!(provider = %name, generation, "Scheduler unit died, restarting");
            }
            Ok(UnitExit::Cancelled) => return,
            Err(e) if e.is_cancelled() => {
                tracing::warn!(provider = %name, generation, "Scheduler unit was aborted, restarting");
            }
            Err(e) => {
                tracing::error!(provider = %name, generation, error = %e, "Scheduler unit crashed, restarting");
            }
        }
    }
}
