//! One runway-allocation pass, as driven by the ATC loop.
//!
//! Pass order: emergencies, then the cargo preference for the flexible
//! runway, then directional routing, then overflow. Queue heads are peeked
//! and only popped once the pass has decided to assign them, so an aircraft
//! that is examined but not taken keeps its place and its FCFS age.

use crate::models::{AircraftClass, AircraftId, World};
use crate::runway::{RunwayBoard, RunwayId};
use crate::scheduler::{FlightScheduler, QueueKind};

/// Why an aircraft was put on a runway, for the ATC log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentReason {
    Emergency,
    CargoPreference,
    Directional,
    Overflow,
}

impl AssignmentReason {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentReason::Emergency => "emergency",
            AssignmentReason::CargoPreference => "cargo preference",
            AssignmentReason::Directional => "directional",
            AssignmentReason::Overflow => "overflow",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Assignment {
    pub aircraft: AircraftId,
    pub runway: RunwayId,
    pub reason: AssignmentReason,
}

fn flow_queue(world: &World, id: AircraftId) -> QueueKind {
    if world.get(id).direction().is_arrival() {
        QueueKind::Arrival
    } else {
        QueueKind::Departure
    }
}

/// Route an emergency to its preferred runway: A for arriving traffic, B
/// for departing, the flexible C as fallback for either.
fn place_emergency(world: &World, board: &RunwayBoard, id: AircraftId) -> Option<RunwayId> {
    let preferred = if world.get(id).direction().is_arrival() {
        RunwayId::A
    } else {
        RunwayId::B
    };
    if board.try_assign(preferred, world, id) {
        return Some(preferred);
    }
    if board.try_assign(RunwayId::C, world, id) {
        return Some(RunwayId::C);
    }
    None
}

/// Perform one allocation pass. Returns the assignments made, in order.
///
/// A single ATC task must be the only caller; the pass is atomic only with
/// respect to other passes, not to releases by aircraft tasks (which can
/// only free runways, never occupy them).
pub fn run_pass(
    world: &World,
    scheduler: &FlightScheduler,
    board: &RunwayBoard,
) -> Vec<Assignment> {
    let mut assignments = Vec::new();

    // Emergencies outrank everything. A pass that serves one ends there; a
    // pass that cannot place one puts it back (stamp preserved) and ends.
    if let Some(id) = scheduler.take_emergency(world) {
        match place_emergency(world, board, id) {
            Some(runway) => {
                assignments.push(Assignment {
                    aircraft: id,
                    runway,
                    reason: AssignmentReason::Emergency,
                });
            }
            None => {
                scheduler.re_enroll(world, flow_queue(world, id), id);
            }
        }
        return assignments;
    }

    // Cargo preference for the flexible runway. Only the head of each queue
    // is considered, and a non-cargo head is left untouched.
    if board.is_free(RunwayId::C) {
        for kind in [QueueKind::Arrival, QueueKind::Departure] {
            let Some(head) = scheduler.peek_next(kind) else {
                continue;
            };
            if world.get(head).class() != AircraftClass::Cargo {
                continue;
            }
            if scheduler.remove(kind, head) && board.try_assign(RunwayId::C, world, head) {
                assignments.push(Assignment {
                    aircraft: head,
                    runway: RunwayId::C,
                    reason: AssignmentReason::CargoPreference,
                });
                return assignments;
            }
        }
    }

    // Directional routing: arrivals to A, departures to B.
    if board.is_free(RunwayId::A) {
        if let Some(head) = scheduler.peek_next(QueueKind::Arrival) {
            if world.get(head).direction().is_arrival()
                && scheduler.remove(QueueKind::Arrival, head)
                && board.try_assign(RunwayId::A, world, head)
            {
                assignments.push(Assignment {
                    aircraft: head,
                    runway: RunwayId::A,
                    reason: AssignmentReason::Directional,
                });
            }
        }
    }
    if board.is_free(RunwayId::B) {
        if let Some(head) = scheduler.peek_next(QueueKind::Departure) {
            if !world.get(head).direction().is_arrival()
                && scheduler.remove(QueueKind::Departure, head)
                && board.try_assign(RunwayId::B, world, head)
            {
                assignments.push(Assignment {
                    aircraft: head,
                    runway: RunwayId::B,
                    reason: AssignmentReason::Directional,
                });
            }
        }
    }

    // Whatever is still waiting can overflow onto C, arrivals first.
    if board.is_free(RunwayId::C) {
        let overflow = scheduler
            .take_next(QueueKind::Arrival)
            .or_else(|| scheduler.take_next(QueueKind::Departure));
        if let Some(id) = overflow {
            if board.try_assign(RunwayId::C, world, id) {
                assignments.push(Assignment {
                    aircraft: id,
                    runway: RunwayId::C,
                    reason: AssignmentReason::Overflow,
                });
            } else {
                scheduler.re_enroll(world, flow_queue(world, id), id);
            }
        }
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Aircraft, AircraftClass, Direction};

    fn build_world(specs: &[(AircraftClass, Direction)]) -> World {
        World::new(
            specs
                .iter()
                .enumerate()
                .map(|(i, (class, dir))| Aircraft::new(AircraftId(i), "XY", *class, *dir))
                .collect(),
        )
    }

    #[test]
    fn cargo_arrival_prefers_the_flexible_runway() {
        // One Cargo arrival from the north, A and C both free - the
        // cargo preference must put it on C, not A.
        let world = build_world(&[(AircraftClass::Cargo, Direction::North)]);
        let scheduler = FlightScheduler::new();
        let board = RunwayBoard::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));

        let assignments = run_pass(&world, &scheduler, &board);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].runway, RunwayId::C);
        assert_eq!(assignments[0].reason, AssignmentReason::CargoPreference);
        assert!(board.is_free(RunwayId::A));
    }

    #[test]
    fn emergency_departure_takes_runway_b_first() {
        // Two departures, one with an emergency - the emergency goes to
        // B in the first pass and the other stays queued.
        let world = build_world(&[
            (AircraftClass::Commercial, Direction::East),
            (AircraftClass::Commercial, Direction::West),
        ]);
        let scheduler = FlightScheduler::new();
        let board = RunwayBoard::new();
        scheduler.enroll(&world, QueueKind::Departure, AircraftId(0));
        scheduler.enroll(&world, QueueKind::Departure, AircraftId(1));
        world.get(AircraftId(0)).declare_emergency(2);

        let assignments = run_pass(&world, &scheduler, &board);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].aircraft, AircraftId(0));
        assert_eq!(assignments[0].runway, RunwayId::B);
        assert_eq!(assignments[0].reason, AssignmentReason::Emergency);
        assert_eq!(scheduler.queue_contents(QueueKind::Departure), vec![AircraftId(1)]);
    }

    #[test]
    fn emergency_with_no_free_runway_is_returned_with_its_stamp() {
        let world = build_world(&[
            (AircraftClass::Commercial, Direction::North),
            (AircraftClass::Commercial, Direction::South),
            (AircraftClass::Commercial, Direction::East),
            (AircraftClass::Commercial, Direction::North),
        ]);
        let scheduler = FlightScheduler::new();
        let board = RunwayBoard::new();
        assert!(board.try_assign(RunwayId::A, &world, AircraftId(0)));
        assert!(board.try_assign(RunwayId::C, &world, AircraftId(1)));
        assert!(board.try_assign(RunwayId::B, &world, AircraftId(2)));

        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(3));
        let plane = world.get(AircraftId(3));
        plane.declare_emergency(1);
        let stamp = plane.queue_entered_at();

        let assignments = run_pass(&world, &scheduler, &board);
        assert!(assignments.is_empty());
        assert_eq!(scheduler.queue_contents(QueueKind::Arrival), vec![AircraftId(3)]);
        assert_eq!(plane.queue_entered_at(), stamp);
        assert!(plane.assigned_runway().is_none());
    }

    #[test]
    fn emergency_is_served_whenever_any_runway_is_free() {
        // Only the flexible runway is left; an arriving emergency must still
        // be placed during the pass.
        let world = build_world(&[
            (AircraftClass::Commercial, Direction::North),
            (AircraftClass::Commercial, Direction::East),
            (AircraftClass::Medical, Direction::South),
        ]);
        let scheduler = FlightScheduler::new();
        let board = RunwayBoard::new();
        assert!(board.try_assign(RunwayId::A, &world, AircraftId(0)));
        assert!(board.try_assign(RunwayId::B, &world, AircraftId(1)));

        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(2));
        world.get(AircraftId(2)).declare_emergency(2);

        let assignments = run_pass(&world, &scheduler, &board);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].runway, RunwayId::C);
        assert_eq!(assignments[0].reason, AssignmentReason::Emergency);
    }

    #[test]
    fn directional_routing_fills_a_and_b_in_one_pass() {
        let world = build_world(&[
            (AircraftClass::Commercial, Direction::North),
            (AircraftClass::Commercial, Direction::West),
        ]);
        let scheduler = FlightScheduler::new();
        let board = RunwayBoard::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));
        scheduler.enroll(&world, QueueKind::Departure, AircraftId(1));

        let assignments = run_pass(&world, &scheduler, &board);
        let runways: Vec<_> = assignments.iter().map(|a| a.runway).collect();
        assert_eq!(runways, vec![RunwayId::A, RunwayId::B]);
        assert_eq!(scheduler.queue_len(QueueKind::Arrival), 0);
        assert_eq!(scheduler.queue_len(QueueKind::Departure), 0);
    }

    #[test]
    fn non_cargo_head_is_not_disturbed_by_the_cargo_check() {
        // A commercial arrival at the head of the queue is peeked by the
        // cargo step but must be assigned directionally to A, with C still
        // free afterwards for anyone else.
        let world = build_world(&[(AircraftClass::Commercial, Direction::North)]);
        let scheduler = FlightScheduler::new();
        let board = RunwayBoard::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));
        let stamp = world.get(AircraftId(0)).queue_entered_at();

        let assignments = run_pass(&world, &scheduler, &board);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].runway, RunwayId::A);
        assert_eq!(world.get(AircraftId(0)).queue_entered_at(), stamp);
        assert!(board.is_free(RunwayId::C));
    }

    #[test]
    fn blocked_arrival_overflows_onto_c() {
        let world = build_world(&[
            (AircraftClass::Commercial, Direction::North),
            (AircraftClass::Commercial, Direction::South),
        ]);
        let scheduler = FlightScheduler::new();
        let board = RunwayBoard::new();
        assert!(board.try_assign(RunwayId::A, &world, AircraftId(0)));

        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(1));
        let assignments = run_pass(&world, &scheduler, &board);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].runway, RunwayId::C);
        assert_eq!(assignments[0].reason, AssignmentReason::Overflow);
    }
}
