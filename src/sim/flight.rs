//! The per-aircraft flight task.
//!
//! Each aircraft runs one of these: it enrolls itself in the right queue,
//! polls for a runway once per tick, and once assigned walks its phase
//! sequence with fixed dwells, releasing the runway at the terminal ground
//! state. An aircraft that waits too long aborts, removing itself from its
//! queue so no runway is ever assigned to a task that is gone.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use acx_core::models::{Aircraft, FlightPhase, World};
use acx_core::scheduler::QueueKind;
use acx_core::{bands, AircraftId, FlightScheduler, RunwayBoard};

use crate::config::Config;

/// Dwell ticks per phase between runway assignment and release.
const APPROACH_TICKS: u32 = 3;
const LANDING_TICKS: u32 = 2;
const TAXI_TICKS: u32 = 2;
const TAKEOFF_TICKS: u32 = 2;
const CLIMB_TICKS: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct FlightTiming {
    /// Length of one engine tick, and the runway-flag poll interval.
    pub poll_interval: Duration,
    /// Ticks to wait for a runway before aborting.
    pub max_polls: u32,
}

impl From<&Config> for FlightTiming {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_polls: config.runway_wait_polls,
        }
    }
}

/// One engine tick: resample speed for the current phase, refresh the
/// advisory self-check, maybe develop an emergency.
fn tick(plane: &Aircraft) {
    let mut rng = rand::thread_rng();
    let phase = plane.phase();
    let speed = bands::sample_speed(phase, plane.speed(), &mut rng);
    plane.set_speed(speed);
    plane.set_latent_violation(bands::is_violation(phase, speed));

    if plane.emergency_level() == 0
        && rng.gen_range(0..100) < plane.direction().emergency_percent()
    {
        let level = rng.gen_range(1..=3);
        if plane.declare_emergency(level) {
            warn!(
                flight = plane.flight_number(),
                level, "aircraft declared an emergency"
            );
        }
    }
}

/// Enter `phase` and stay there for `ticks` engine ticks.
async fn dwell(plane: &Aircraft, phase: FlightPhase, ticks: u32, tick_len: Duration) {
    plane.set_phase(phase);
    tick(plane);
    for _ in 0..ticks {
        tokio::time::sleep(tick_len).await;
        tick(plane);
    }
}

/// Drive one aircraft from enrollment to completion (or timeout).
pub async fn fly(
    world: Arc<World>,
    id: AircraftId,
    scheduler: Arc<FlightScheduler>,
    board: Arc<RunwayBoard>,
    timing: FlightTiming,
    cancel: CancellationToken,
) {
    let plane = world.get(id);
    plane.set_active(true);

    let kind = if plane.direction().is_arrival() {
        QueueKind::Arrival
    } else {
        QueueKind::Departure
    };
    scheduler.enroll(&world, kind, id);
    info!(
        flight = plane.flight_number(),
        class = plane.class().as_str(),
        direction = plane.direction().as_str(),
        queue = kind.as_str(),
        "flight active, enrolled"
    );

    let mut got_runway = false;
    for waited in 1..=timing.max_polls {
        if plane.has_runway_assigned() {
            got_runway = true;
            break;
        }
        if cancel.is_cancelled() {
            break;
        }
        tokio::time::sleep(timing.poll_interval).await;
        tick(plane);
        if waited % 5 == 0 {
            if let Some(wait) = scheduler.estimate_wait(id) {
                info!(
                    flight = plane.flight_number(),
                    "waiting for runway, estimated {} min",
                    wait.as_secs() / 60
                );
            }
        }
    }

    if !got_runway {
        // The allocator may have taken us between the last poll and now; if
        // the removal fails and a runway showed up, carry on flying.
        if !scheduler.remove(kind, id) && plane.has_runway_assigned() {
            got_runway = true;
        }
    }

    if !got_runway {
        if cancel.is_cancelled() {
            debug!(flight = plane.flight_number(), "shutdown while waiting for runway");
        } else {
            warn!(flight = plane.flight_number(), "timed out waiting for runway, aborting");
        }
        plane.set_active(false);
        return;
    }

    info!(flight = plane.flight_number(), "runway assigned");
    if plane.direction().is_arrival() {
        dwell(plane, FlightPhase::Approach, APPROACH_TICKS, timing.poll_interval).await;
        dwell(plane, FlightPhase::Landing, LANDING_TICKS, timing.poll_interval).await;
        dwell(plane, FlightPhase::Taxi, TAXI_TICKS, timing.poll_interval).await;
        plane.set_phase(FlightPhase::AtGate);
        tick(plane);
        release_runway(plane, &board);
        info!(flight = plane.flight_number(), "arrived at gate");
    } else {
        dwell(plane, FlightPhase::Taxi, TAXI_TICKS, timing.poll_interval).await;
        dwell(plane, FlightPhase::TakeoffRoll, TAKEOFF_TICKS, timing.poll_interval).await;
        dwell(plane, FlightPhase::Climb, CLIMB_TICKS, timing.poll_interval).await;
        plane.set_phase(FlightPhase::Cruise);
        tick(plane);
        release_runway(plane, &board);
        info!(flight = plane.flight_number(), "reached cruising altitude");
    }

    plane.set_active(false);
    info!(flight = plane.flight_number(), "flight complete");
}

fn release_runway(plane: &Aircraft, board: &RunwayBoard) {
    if let Some(runway) = plane.assigned_runway() {
        board.release(runway);
        plane.clear_runway();
        debug!(flight = plane.flight_number(), runway = %runway, "runway released");
    }
}
