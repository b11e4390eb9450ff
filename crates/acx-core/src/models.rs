//! Core data models for the AirControlX system.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::runway::RunwayId;

/// Current wall-clock time as whole seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Aircraft classes, in the order the priority policy cares about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AircraftClass {
    Commercial,
    Cargo,
    Military,
    Medical,
    Emergency,
}

impl AircraftClass {
    /// Class term of the priority score. The emergency *class* falls back
    /// to the commercial bias; emergency *status* is scored separately
    /// through the emergency-level term.
    pub fn priority_bias(self) -> i64 {
        match self {
            AircraftClass::Medical => 1000,
            AircraftClass::Military => 800,
            AircraftClass::Cargo => 600,
            AircraftClass::Commercial | AircraftClass::Emergency => 400,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AircraftClass::Commercial => "Commercial",
            AircraftClass::Cargo => "Cargo",
            AircraftClass::Military => "Military",
            AircraftClass::Medical => "Medical",
            AircraftClass::Emergency => "Emergency",
        }
    }
}

/// Compass direction of a flight. North/South traffic is arriving,
/// East/West traffic is departing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn is_arrival(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }

    /// Per-tick emergency probability, in percent.
    pub fn emergency_percent(self) -> u32 {
        match self {
            Direction::North => 10,
            Direction::South => 5,
            Direction::East => 15,
            Direction::West => 20,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::East => "East",
            Direction::West => "West",
        }
    }
}

/// Phase of the flight state machine.
///
/// Arrivals run Holding → Approach → Landing → Taxi → AtGate; departures run
/// AtGate → Taxi → TakeoffRoll → Climb → Cruise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    Holding,
    Approach,
    Landing,
    Taxi,
    AtGate,
    TakeoffRoll,
    Climb,
    Cruise,
}

impl FlightPhase {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            FlightPhase::Holding => 0,
            FlightPhase::Approach => 1,
            FlightPhase::Landing => 2,
            FlightPhase::Taxi => 3,
            FlightPhase::AtGate => 4,
            FlightPhase::TakeoffRoll => 5,
            FlightPhase::Climb => 6,
            FlightPhase::Cruise => 7,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => FlightPhase::Holding,
            1 => FlightPhase::Approach,
            2 => FlightPhase::Landing,
            3 => FlightPhase::Taxi,
            4 => FlightPhase::AtGate,
            5 => FlightPhase::TakeoffRoll,
            6 => FlightPhase::Climb,
            _ => FlightPhase::Cruise,
        }
    }

    pub fn is_airborne(self) -> bool {
        matches!(
            self,
            FlightPhase::Holding | FlightPhase::Approach | FlightPhase::Climb | FlightPhase::Cruise
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlightPhase::Holding => "Holding",
            FlightPhase::Approach => "Approach",
            FlightPhase::Landing => "Landing",
            FlightPhase::Taxi => "Taxi",
            FlightPhase::AtGate => "AtGate",
            FlightPhase::TakeoffRoll => "TakeoffRoll",
            FlightPhase::Climb => "Climb",
            FlightPhase::Cruise => "Cruise",
        }
    }
}

/// Stable index of an aircraft in the world table. Queues and the active
/// list store these instead of references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AircraftId(pub usize);

impl std::fmt::Display for AircraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

const NO_RUNWAY: u8 = u8::MAX;

/// One simulated flight.
///
/// The mutable fields are atomics: the aircraft's own task writes phase,
/// speed and emergency level; the scheduler stamps the queue-entry time; the
/// allocator sets the runway assignment; the radar sets the active-violation
/// flag. Everything else is fixed at construction.
#[derive(Debug)]
pub struct Aircraft {
    id: AircraftId,
    flight_number: String,
    airline: String,
    class: AircraftClass,
    direction: Direction,
    phase: AtomicU8,
    speed: AtomicI32,
    emergency: AtomicU8,
    latent_violation: AtomicBool,
    active_violation: AtomicBool,
    queue_entered_at: AtomicU64,
    runway: AtomicU8,
    active: AtomicBool,
}

impl Aircraft {
    pub fn new(id: AircraftId, airline: &str, class: AircraftClass, direction: Direction) -> Self {
        let initial_phase = if direction.is_arrival() {
            FlightPhase::Holding
        } else {
            FlightPhase::AtGate
        };
        Self {
            id,
            flight_number: format!("{}-{}", airline, id.0),
            airline: airline.to_string(),
            class,
            direction,
            phase: AtomicU8::new(initial_phase.as_u8()),
            speed: AtomicI32::new(0),
            emergency: AtomicU8::new(0),
            latent_violation: AtomicBool::new(false),
            active_violation: AtomicBool::new(false),
            queue_entered_at: AtomicU64::new(0),
            runway: AtomicU8::new(NO_RUNWAY),
            active: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> AircraftId {
        self.id
    }

    pub fn flight_number(&self) -> &str {
        &self.flight_number
    }

    pub fn airline(&self) -> &str {
        &self.airline
    }

    pub fn class(&self) -> AircraftClass {
        self.class
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn phase(&self) -> FlightPhase {
        FlightPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: FlightPhase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    pub fn speed(&self) -> i32 {
        self.speed.load(Ordering::SeqCst)
    }

    pub fn set_speed(&self, speed: i32) {
        self.speed.store(speed, Ordering::SeqCst);
    }

    pub fn emergency_level(&self) -> u8 {
        self.emergency.load(Ordering::SeqCst)
    }

    /// Raise the emergency level. Emergencies are sticky: once a level is
    /// set it stays for the lifetime of the flight.
    pub fn declare_emergency(&self, level: u8) -> bool {
        self.emergency
            .compare_exchange(0, level.clamp(1, 3), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn has_latent_violation(&self) -> bool {
        self.latent_violation.load(Ordering::SeqCst)
    }

    pub fn set_latent_violation(&self, value: bool) {
        self.latent_violation.store(value, Ordering::SeqCst);
    }

    pub fn has_active_violation(&self) -> bool {
        self.active_violation.load(Ordering::SeqCst)
    }

    /// Mark the aircraft as having a notice in flight. Returns false if it
    /// was already flagged, so the radar reports each condition once.
    pub fn flag_active_violation(&self) -> bool {
        !self.active_violation.swap(true, Ordering::SeqCst)
    }

    /// Clear the active-violation flag once the matching notice is settled.
    pub fn clear_active_violation(&self) {
        self.active_violation.store(false, Ordering::SeqCst);
    }

    pub fn queue_entered_at(&self) -> Option<u64> {
        match self.queue_entered_at.load(Ordering::SeqCst) {
            0 => None,
            t => Some(t),
        }
    }

    pub fn stamp_queue_entry(&self, now: u64) {
        self.queue_entered_at.store(now, Ordering::SeqCst);
    }

    pub fn assigned_runway(&self) -> Option<RunwayId> {
        RunwayId::from_u8(self.runway.load(Ordering::SeqCst))
    }

    pub fn has_runway_assigned(&self) -> bool {
        self.assigned_runway().is_some()
    }

    pub fn assign_runway(&self, runway: RunwayId) {
        self.runway.store(runway.as_u8(), Ordering::SeqCst);
    }

    pub fn clear_runway(&self) {
        self.runway.store(NO_RUNWAY, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, value: bool) {
        self.active.store(value, Ordering::SeqCst);
    }

    /// Priority score, higher wins. Sum of the emergency term
    /// (10 000 × level), the class bias, and the whole seconds spent in the
    /// queue, which implements FCFS within a class.
    pub fn priority_score(&self, now: u64) -> i64 {
        let mut score = 0;
        let emergency = self.emergency_level() as i64;
        if emergency > 0 {
            score += 10_000 * emergency;
        }
        score += self.class.priority_bias();
        if let Some(entered) = self.queue_entered_at() {
            score += now.saturating_sub(entered) as i64;
        }
        score
    }

    pub fn snapshot(&self) -> AircraftSnapshot {
        AircraftSnapshot {
            flight_number: self.flight_number.clone(),
            airline: self.airline.clone(),
            class: self.class,
            direction: self.direction,
            phase: self.phase(),
            speed: self.speed(),
            emergency_level: self.emergency_level(),
            latent_violation: self.has_latent_violation(),
            active_violation: self.has_active_violation(),
            runway: self.assigned_runway().map(|r| r.as_char()),
            active: self.is_active(),
        }
    }
}

/// Read-only view of one aircraft, for display collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    pub flight_number: String,
    pub airline: String,
    pub class: AircraftClass,
    pub direction: Direction,
    pub phase: FlightPhase,
    pub speed: i32,
    pub emergency_level: u8,
    pub latent_violation: bool,
    pub active_violation: bool,
    pub runway: Option<char>,
    pub active: bool,
}

/// Per-run arena of aircraft. Built once by the driver and threaded
/// explicitly into every operation that resolves an [`AircraftId`]; there is
/// no process-wide mutable state.
#[derive(Debug, Default)]
pub struct World {
    aircraft: Vec<Aircraft>,
}

impl World {
    pub fn new(aircraft: Vec<Aircraft>) -> Self {
        Self { aircraft }
    }

    pub fn get(&self, id: AircraftId) -> &Aircraft {
        &self.aircraft[id.0]
    }

    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = AircraftId> + '_ {
        (0..self.aircraft.len()).map(AircraftId)
    }
}
