//! Read-only state snapshots for display collaborators.
//!
//! The core exposes plain data only: phases, speeds, flags, queue orders.
//! Rendering is the consumer's job.

use serde::Serialize;

use acx_core::{
    AircraftSnapshot, FlightScheduler, QueueKind, RunwayBoard, RunwaySnapshot, World,
};

#[derive(Debug, Clone, Serialize)]
pub struct SimSnapshot {
    pub aircraft: Vec<AircraftSnapshot>,
    pub runways: Vec<RunwaySnapshot>,
    /// Flight numbers, head of the queue first.
    pub arrival_queue: Vec<String>,
    pub departure_queue: Vec<String>,
}

fn queue_flights(world: &World, scheduler: &FlightScheduler, kind: QueueKind) -> Vec<String> {
    scheduler
        .queue_contents(kind)
        .into_iter()
        .map(|id| world.get(id).flight_number().to_string())
        .collect()
}

pub fn capture(world: &World, scheduler: &FlightScheduler, board: &RunwayBoard) -> SimSnapshot {
    SimSnapshot {
        aircraft: world.iter().map(|plane| plane.snapshot()).collect(),
        runways: board.snapshot(),
        arrival_queue: queue_flights(world, scheduler, QueueKind::Arrival),
        departure_queue: queue_flights(world, scheduler, QueueKind::Departure),
    }
}
