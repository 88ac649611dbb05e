use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::ports::outbound::ProgressReporter;

/// Reports progress as log lines, with the elapsed time on `stop`.
///
/// Timers are kept per run, so overlapping runs on one orchestrator each
/// report their own elapsed time.
#[derive(Debug, Default)]
pub struct TracingProgress {
    started: Mutex<HashMap<Uuid, Instant>>,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for TracingProgress {
    fn start(&self, run_id: Uuid, message: &str) {
        self.started.lock().insert(run_id, Instant::now());
        info!(target: "ns::progress", run_id = %run_id, "{message}");
    }

    fn stop(&self, run_id: Uuid, message: &str) {
        match self.started.lock().remove(&run_id) {
            Some(started) => info!(
                target: "ns::progress",
                run_id = %run_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "{message}"
            ),
            None => info!(target: "ns::progress", run_id = %run_id, "{message}"),
        }
    }
}
