//! Phase-specific speed rules.
//!
//! Each phase has a *sampling* rule, used by the flight engine to produce a
//! new speed every tick, and a *legal band* with a violation rule, used by
//! the radar. The two are deliberately separate: the simulator can generate
//! a speed the radar will object to.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::FlightPhase;

/// Legal speed range for a phase, in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedBand {
    pub min: i32,
    pub max: i32,
}

/// How a phase's legal band is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Enforcement {
    /// Only speeds above the band's max violate.
    UpperOnly,
    /// Speeds outside the band on either side violate.
    BothBounds,
    /// Speeds strictly above the threshold violate; the band itself is
    /// narrower than the tolerance (the gate case).
    OverThreshold(i32),
}

pub fn legal_band(phase: FlightPhase) -> SpeedBand {
    let (min, max) = match phase {
        FlightPhase::Holding => (400, 600),
        FlightPhase::Approach => (240, 290),
        FlightPhase::Landing => (30, 240),
        FlightPhase::Taxi => (15, 30),
        FlightPhase::AtGate => (0, 5),
        FlightPhase::TakeoffRoll => (0, 290),
        FlightPhase::Climb => (250, 463),
        FlightPhase::Cruise => (800, 900),
    };
    SpeedBand { min, max }
}

fn enforcement(phase: FlightPhase) -> Enforcement {
    match phase {
        FlightPhase::Approach | FlightPhase::Cruise => Enforcement::BothBounds,
        FlightPhase::AtGate => Enforcement::OverThreshold(10),
        FlightPhase::Holding
        | FlightPhase::Landing
        | FlightPhase::Taxi
        | FlightPhase::TakeoffRoll
        | FlightPhase::Climb => Enforcement::UpperOnly,
    }
}

/// Whether `speed` violates the legal band of `phase`.
pub fn is_violation(phase: FlightPhase, speed: i32) -> bool {
    let band = legal_band(phase);
    match enforcement(phase) {
        Enforcement::UpperOnly => speed > band.max,
        Enforcement::BothBounds => speed < band.min || speed > band.max,
        Enforcement::OverThreshold(limit) => speed > limit,
    }
}

/// Produce the next speed for `phase`. Landing decelerates and TakeoffRoll
/// accelerates monotonically from the previous sample; every other phase
/// draws uniformly from its sampling range.
pub fn sample_speed<R: Rng>(phase: FlightPhase, previous: i32, rng: &mut R) -> i32 {
    match phase {
        FlightPhase::Holding => rng.gen_range(400..=600),
        FlightPhase::Approach => rng.gen_range(240..=290),
        FlightPhase::Landing => (previous - 20).max(30),
        FlightPhase::Taxi => rng.gen_range(15..=30),
        FlightPhase::AtGate => rng.gen_range(0..=5),
        FlightPhase::TakeoffRoll => (previous + 15).min(290),
        FlightPhase::Climb => rng.gen_range(250..=463),
        FlightPhase::Cruise => rng.gen_range(800..=900),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn holding_enforces_only_the_upper_bound() {
        assert!(is_violation(FlightPhase::Holding, 601));
        assert!(!is_violation(FlightPhase::Holding, 600));
        // Below the sampling range, but only the ceiling is enforced.
        assert!(!is_violation(FlightPhase::Holding, 350));
    }

    #[test]
    fn approach_enforces_both_bounds() {
        assert!(is_violation(FlightPhase::Approach, 310));
        assert!(is_violation(FlightPhase::Approach, 239));
        assert!(!is_violation(FlightPhase::Approach, 240));
        assert!(!is_violation(FlightPhase::Approach, 290));
    }

    #[test]
    fn gate_tolerates_up_to_ten() {
        assert!(!is_violation(FlightPhase::AtGate, 10));
        assert!(is_violation(FlightPhase::AtGate, 11));
    }

    #[test]
    fn cruise_enforces_both_bounds() {
        assert!(is_violation(FlightPhase::Cruise, 799));
        assert!(is_violation(FlightPhase::Cruise, 901));
        assert!(!is_violation(FlightPhase::Cruise, 850));
    }

    #[test]
    fn landing_decelerates_to_the_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut speed = 250;
        for _ in 0..20 {
            let next = sample_speed(FlightPhase::Landing, speed, &mut rng);
            assert!(next <= speed);
            speed = next;
        }
        assert_eq!(speed, 30);
    }

    #[test]
    fn takeoff_roll_accelerates_to_the_cap() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut speed = 20;
        for _ in 0..30 {
            let next = sample_speed(FlightPhase::TakeoffRoll, speed, &mut rng);
            assert!(next >= speed);
            speed = next;
        }
        assert_eq!(speed, 290);
    }

    #[test]
    fn uniform_phases_sample_inside_their_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let s = sample_speed(FlightPhase::Climb, 0, &mut rng);
            assert!((250..=463).contains(&s));
            let s = sample_speed(FlightPhase::Cruise, 0, &mut rng);
            assert!((800..=900).contains(&s));
        }
    }
}
