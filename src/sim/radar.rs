//! The radar loop: sample every active flight and report violations.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use acx_core::{bands, FlightScheduler, World};
use acx_ipc::ViolationFrame;

/// One radar sweep. Flags each violating aircraft and returns the frames to
/// emit; an aircraft already carrying an active violation is skipped until
/// the flag is cleared.
pub fn sweep(world: &World, scheduler: &FlightScheduler) -> Vec<ViolationFrame> {
    let mut frames = Vec::new();
    for id in scheduler.active_flights() {
        let plane = world.get(id);
        if !plane.is_active() || plane.has_active_violation() {
            continue;
        }
        let phase = plane.phase();
        let speed = plane.speed();
        if !bands::is_violation(phase, speed) {
            continue;
        }
        if plane.flag_active_violation() {
            warn!(
                flight = plane.flight_number(),
                phase = phase.as_str(),
                speed,
                "speed violation detected"
            );
            frames.push(ViolationFrame::new(
                plane.flight_number(),
                plane.airline(),
                speed,
                bands::legal_band(phase),
            ));
        }
    }
    frames
}

/// Run the radar at `cadence`, writing violation frames to the notice
/// generator. A failed write is logged and the frame dropped; the generator
/// is expected to be live for the whole run.
pub async fn run_radar_loop<W>(
    world: Arc<World>,
    scheduler: Arc<FlightScheduler>,
    mut violations: W,
    cadence: Duration,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    info!("radar active");
    let mut ticker = interval(cadence);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        for frame in sweep(&world, &scheduler) {
            if let Err(e) = frame.write_to(&mut violations).await {
                error!(
                    flight = %frame.flight_number,
                    error = %e,
                    "dropping violation frame"
                );
            }
        }
    }
    info!("radar stopping");
}
