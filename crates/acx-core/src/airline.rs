//! The airline registry and fleet construction.

use crate::models::{Aircraft, AircraftClass, AircraftId, Direction, World};

/// Static description of one operating airline.
#[derive(Debug, Clone, Copy)]
pub struct AirlineSpec {
    pub name: &'static str,
    pub class: AircraftClass,
    pub fleet: usize,
    pub initial_balance: i64,
}

/// The six operating airlines. Names are single tokens so a flight number
/// (`<airline>-<index>`) always parses back to its airline.
pub const AIRLINES: [AirlineSpec; 6] = [
    AirlineSpec {
        name: "PIA",
        class: AircraftClass::Commercial,
        fleet: 4,
        initial_balance: 1_000_000,
    },
    AirlineSpec {
        name: "AirBlue",
        class: AircraftClass::Commercial,
        fleet: 4,
        initial_balance: 800_000,
    },
    AirlineSpec {
        name: "FedEx",
        class: AircraftClass::Cargo,
        fleet: 2,
        initial_balance: 1_500_000,
    },
    AirlineSpec {
        name: "PakistanAirforce",
        class: AircraftClass::Military,
        fleet: 1,
        initial_balance: 2_000_000,
    },
    AirlineSpec {
        name: "BlueDart",
        class: AircraftClass::Cargo,
        fleet: 2,
        initial_balance: 1_200_000,
    },
    AirlineSpec {
        name: "AghaKhanAir",
        class: AircraftClass::Medical,
        fleet: 1,
        initial_balance: 1_500_000,
    },
];

pub fn class_for_airline(name: &str) -> Option<AircraftClass> {
    AIRLINES.iter().find(|a| a.name == name).map(|a| a.class)
}

/// Recover the airline from a flight number of the form `<airline>-<n>`.
pub fn airline_of_flight(flight: &str) -> Option<&str> {
    let prefix = flight.split('-').next()?;
    AIRLINES.iter().find(|a| a.name == prefix).map(|a| a.name)
}

/// Direction of the aircraft at world index `idx`: even indices arrive
/// (alternating North/South), odd indices depart (alternating East/West).
fn direction_for_index(idx: usize) -> Direction {
    match idx % 4 {
        0 => Direction::North,
        1 => Direction::East,
        2 => Direction::South,
        _ => Direction::West,
    }
}

/// Build the per-run world: every airline contributes its fleet, capped at
/// `max_aircraft` overall.
pub fn build_world(max_aircraft: usize) -> World {
    let mut aircraft = Vec::new();
    for spec in AIRLINES {
        for _ in 0..spec.fleet {
            if aircraft.len() >= max_aircraft {
                return World::new(aircraft);
            }
            let idx = aircraft.len();
            aircraft.push(Aircraft::new(
                AircraftId(idx),
                spec.name,
                spec.class,
                direction_for_index(idx),
            ));
        }
    }
    World::new(aircraft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlightPhase;

    #[test]
    fn full_fleet_has_fourteen_aircraft() {
        let world = build_world(20);
        assert_eq!(world.len(), 14);
    }

    #[test]
    fn even_indices_arrive_and_odd_ones_depart() {
        let world = build_world(20);
        for plane in world.iter() {
            if plane.id().0 % 2 == 0 {
                assert!(plane.direction().is_arrival());
                assert_eq!(plane.phase(), FlightPhase::Holding);
            } else {
                assert!(!plane.direction().is_arrival());
                assert_eq!(plane.phase(), FlightPhase::AtGate);
            }
        }
    }

    #[test]
    fn flight_numbers_round_trip_to_airlines() {
        let world = build_world(20);
        for plane in world.iter() {
            assert_eq!(airline_of_flight(plane.flight_number()), Some(plane.airline()));
        }
        assert_eq!(airline_of_flight("NOSUCH-1"), None);
    }

    #[test]
    fn fleet_cap_is_honoured() {
        assert_eq!(build_world(5).len(), 5);
    }
}
