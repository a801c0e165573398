//! Fixed-rate frame loop

use super::controller::{MessageListener, SerialController};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Tick `controller` every `period` until `shutdown` is set
///
/// `on_frame` runs after each tick with the updated controller.
/// Late ticks are skipped rather than bunched up. Returns the number of
/// frames run.
pub async fn run_frame_loop<L, F>(
    controller: &mut SerialController<L>,
    period: Duration,
    shutdown: Arc<AtomicBool>,
    mut on_frame: F,
) -> u64
where
    L: MessageListener,
    F: FnMut(&SerialController<L>),
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut frames = 0u64;
    while !shutdown.load(Ordering::Relaxed) {
        interval.tick().await;
        controller.tick();
        on_frame(controller);
        frames += 1;
    }
    frames
}
