//! The ATC controller loop: one allocation pass per second.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use acx_core::{allocator, FlightScheduler, RunwayBoard, World};

/// Passes between runway status reports.
const STATUS_REPORT_EVERY: u64 = 20;

pub async fn run_atc_loop(
    world: Arc<World>,
    scheduler: Arc<FlightScheduler>,
    board: Arc<RunwayBoard>,
    cadence: Duration,
    cancel: CancellationToken,
) {
    info!("ATC controller active, monitoring flights");
    let mut ticker = interval(cadence);
    let mut passes: u64 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        for assignment in allocator::run_pass(&world, &scheduler, &board) {
            let plane = world.get(assignment.aircraft);
            info!(
                flight = plane.flight_number(),
                runway = %assignment.runway,
                reason = assignment.reason.as_str(),
                "assigned runway"
            );
        }

        passes += 1;
        if passes % STATUS_REPORT_EVERY == 0 {
            info!("\n{}", board.status_report());
        }
    }
    info!("ATC controller stopping");
}
