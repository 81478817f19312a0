use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::ArenaController;

/// Handle to the background clock. Cancelling is idempotent and also
/// happens when the handle is dropped.
#[derive(Debug)]
pub struct ClockHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ClockHandle {
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("Stopping arena clock");
            self.task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Sends one tick per `period` to the controller's active game and quiz
pub fn start_clock(controller: Arc<ArenaController>, period: Duration) -> ClockHandle {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);

    info!(period_ms = period.as_millis() as u64, "Starting arena clock");
    let task = tokio::spawn(async move {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticks.tick().await;

        while !flag.load(Ordering::SeqCst) {
            ticks.tick().await;
            controller.tick().await;
        }
    });

    ClockHandle { cancelled, task }
}
