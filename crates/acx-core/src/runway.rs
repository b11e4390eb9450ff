//! The three runways and their occupancy board.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::{AircraftClass, AircraftId, Direction, World};

/// Runway identifier. A is arrival-only, B departure-only, C flexible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunwayId {
    A,
    B,
    C,
}

impl RunwayId {
    pub const ALL: [RunwayId; 3] = [RunwayId::A, RunwayId::B, RunwayId::C];

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            RunwayId::A => 0,
            RunwayId::B => 1,
            RunwayId::C => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(RunwayId::A),
            1 => Some(RunwayId::B),
            2 => Some(RunwayId::C),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            RunwayId::A => 'A',
            RunwayId::B => 'B',
            RunwayId::C => 'C',
        }
    }

    fn index(self) -> usize {
        self.as_u8() as usize
    }
}

impl std::fmt::Display for RunwayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RWY-{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunwayCategory {
    ArrivalOnly,
    DepartureOnly,
    Flexible,
}

#[derive(Debug)]
struct Runway {
    id: RunwayId,
    category: RunwayCategory,
    occupied_by: Option<AircraftId>,
    turn: u64,
}

impl Runway {
    /// Directional compatibility: arriving traffic (N/S) may use A or C,
    /// departing traffic (E/W) may use B or C. Cargo is additionally always
    /// welcome on the flexible runway.
    fn accepts(&self, direction: Direction, class: AircraftClass) -> bool {
        let directional_ok = if direction.is_arrival() {
            matches!(self.category, RunwayCategory::ArrivalOnly | RunwayCategory::Flexible)
        } else {
            matches!(self.category, RunwayCategory::DepartureOnly | RunwayCategory::Flexible)
        };
        directional_ok
            || (class == AircraftClass::Cargo && self.category == RunwayCategory::Flexible)
    }
}

/// Read-only view of one runway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwaySnapshot {
    pub id: RunwayId,
    pub category: RunwayCategory,
    pub occupied: bool,
    pub turn: u64,
}

/// Occupancy board for the three runways, behind a single lock.
///
/// The ATC task is the only assigning mutator; the aircraft that holds a
/// runway is the only releasing one. The lock keeps the reads coherent for
/// everyone else.
#[derive(Debug)]
pub struct RunwayBoard {
    runways: Mutex<[Runway; 3]>,
}

impl Default for RunwayBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RunwayBoard {
    pub fn new() -> Self {
        Self {
            runways: Mutex::new([
                Runway {
                    id: RunwayId::A,
                    category: RunwayCategory::ArrivalOnly,
                    occupied_by: None,
                    turn: 0,
                },
                Runway {
                    id: RunwayId::B,
                    category: RunwayCategory::DepartureOnly,
                    occupied_by: None,
                    turn: 0,
                },
                Runway {
                    id: RunwayId::C,
                    category: RunwayCategory::Flexible,
                    occupied_by: None,
                    turn: 0,
                },
            ]),
        }
    }

    pub fn is_free(&self, id: RunwayId) -> bool {
        let runways = self.runways.lock().expect("runway lock poisoned");
        runways[id.index()].occupied_by.is_none()
    }

    /// Try to give `runway` to `aircraft`. Fails if the runway is occupied
    /// or the aircraft's direction (and class) are incompatible with it. On
    /// success the aircraft's runway-assignment flag is set before the lock
    /// is dropped.
    pub fn try_assign(&self, runway: RunwayId, world: &World, aircraft: AircraftId) -> bool {
        let plane = world.get(aircraft);
        let mut runways = self.runways.lock().expect("runway lock poisoned");
        let slot = &mut runways[runway.index()];
        if slot.occupied_by.is_some() || !slot.accepts(plane.direction(), plane.class()) {
            return false;
        }
        slot.occupied_by = Some(aircraft);
        plane.assign_runway(runway);
        true
    }

    /// Release `runway` and advance its turn counter. Returns the previous
    /// holder, or `None` if the runway was already free.
    pub fn release(&self, runway: RunwayId) -> Option<AircraftId> {
        let mut runways = self.runways.lock().expect("runway lock poisoned");
        let slot = &mut runways[runway.index()];
        let holder = slot.occupied_by.take();
        if holder.is_some() {
            slot.turn += 1;
        }
        holder
    }

    pub fn snapshot(&self) -> Vec<RunwaySnapshot> {
        let runways = self.runways.lock().expect("runway lock poisoned");
        runways
            .iter()
            .map(|r| RunwaySnapshot {
                id: r.id,
                category: r.category,
                occupied: r.occupied_by.is_some(),
                turn: r.turn,
            })
            .collect()
    }

    /// Formatted occupancy report for the periodic ATC status log.
    pub fn status_report(&self) -> String {
        let runways = self.runways.lock().expect("runway lock poisoned");
        let mut report = String::from("--- RUNWAY STATUS ---\n");
        for r in runways.iter() {
            report.push_str(&format!(
                "{}: {} (turn {})\n",
                r.id,
                if r.occupied_by.is_some() { "OCCUPIED" } else { "AVAILABLE" },
                r.turn
            ));
        }
        report.push_str("---------------------");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Aircraft;

    fn world_with(class: AircraftClass, direction: Direction) -> World {
        World::new(vec![Aircraft::new(AircraftId(0), "PIA", class, direction)])
    }

    #[test]
    fn at_most_one_holder_per_runway() {
        let world = World::new(vec![
            Aircraft::new(AircraftId(0), "PIA", AircraftClass::Commercial, Direction::North),
            Aircraft::new(AircraftId(1), "PIA", AircraftClass::Commercial, Direction::South),
        ]);
        let board = RunwayBoard::new();
        assert!(board.try_assign(RunwayId::A, &world, AircraftId(0)));
        assert!(!board.try_assign(RunwayId::A, &world, AircraftId(1)));
        assert_eq!(board.release(RunwayId::A), Some(AircraftId(0)));
        assert!(board.try_assign(RunwayId::A, &world, AircraftId(1)));
    }

    #[test]
    fn directional_compatibility_is_enforced() {
        let world = world_with(AircraftClass::Commercial, Direction::East);
        let board = RunwayBoard::new();
        // A departure cannot use the arrival runway, but C takes anyone.
        assert!(!board.try_assign(RunwayId::A, &world, AircraftId(0)));
        assert!(board.try_assign(RunwayId::C, &world, AircraftId(0)));
    }

    #[test]
    fn release_advances_the_turn_counter() {
        let world = world_with(AircraftClass::Cargo, Direction::North);
        let board = RunwayBoard::new();
        assert!(board.try_assign(RunwayId::C, &world, AircraftId(0)));
        board.release(RunwayId::C);
        assert!(board.release(RunwayId::C).is_none());
        let snap = board.snapshot();
        assert_eq!(snap[2].turn, 1);
        assert!(!snap[2].occupied);
    }
}
