//! Scripted provider and helpers shared by the scheduler tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::SchedulerSettings;
use crate::providers::EpgProvider;

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Ok,
    Fail,
    Panic,
}

/// Provider that plays back a fixed list of outcomes, then succeeds forever.
pub struct ScriptedProvider {
    name: String,
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(name: &str, script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EpgProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_epg(&self) -> tvp_core::Result<()> {
        let step = self.script.lock().pop_front().unwrap_or(Step::Ok);
        self.calls.fetch_add(1, Ordering::SeqCst);
        match step {
            Step::Ok => Ok(()),
            Step::Fail => Err(tvp_core::Error::provider(&self.name, "scripted failure")),
            Step::Panic => panic!("scripted panic"),
        }
    }

    async fn rebuild_epg(&self) -> tvp_core::Result<()> {
        Ok(())
    }
}

pub fn fast_settings() -> SchedulerSettings {
    SchedulerSettings {
        tick: Duration::from_millis(5),
        init_retry: Duration::from_millis(10),
        supervisor_poll: Duration::from_millis(20),
        max_consecutive_faults: 3,
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
