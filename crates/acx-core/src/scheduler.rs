//! Priority scheduler for the arrival and departure queues.
//!
//! Each queue is kept sorted by descending priority score and re-sorted on
//! every insertion; scores are computed on demand, never cached. The two
//! queues have independent locks, and the emergency scan takes the arrival
//! lock first and the departure lock only if nothing was found; it never
//! holds both at once.

use std::sync::Mutex;
use std::time::Duration;

use crate::models::{unix_now, AircraftId, World};

/// Which of the two queues an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Arrival,
    Departure,
}

impl QueueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueKind::Arrival => "arrival",
            QueueKind::Departure => "departure",
        }
    }
}

/// Cost assumed per queue slot when estimating wait times.
const WAIT_PER_SLOT: Duration = Duration::from_secs(120);

#[derive(Debug, Default)]
pub struct FlightScheduler {
    arrivals: Mutex<Vec<AircraftId>>,
    departures: Mutex<Vec<AircraftId>>,
    /// Every aircraft ever enrolled, in enrollment order. Never shrinks
    /// during a run; display collaborators and the radar read it.
    active: Mutex<Vec<AircraftId>>,
}

impl FlightScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, kind: QueueKind) -> &Mutex<Vec<AircraftId>> {
        match kind {
            QueueKind::Arrival => &self.arrivals,
            QueueKind::Departure => &self.departures,
        }
    }

    fn sort_locked(world: &World, queue: &mut [AircraftId]) {
        let now = unix_now();
        // Stable sort: equal scores keep insertion order.
        queue.sort_by_key(|id| std::cmp::Reverse(world.get(*id).priority_score(now)));
    }

    /// Stamp the aircraft with the current time and insert it.
    pub fn enroll(&self, world: &World, kind: QueueKind, id: AircraftId) {
        world.get(id).stamp_queue_entry(unix_now());
        let mut queue = self.queue(kind).lock().expect("queue lock poisoned");
        queue.push(id);
        Self::sort_locked(world, &mut queue);
        self.active.lock().expect("active lock poisoned").push(id);
    }

    /// Insert an aircraft back into a queue *without* re-stamping it, so its
    /// FCFS age survives being bounced by the allocator.
    pub fn re_enroll(&self, world: &World, kind: QueueKind, id: AircraftId) {
        let mut queue = self.queue(kind).lock().expect("queue lock poisoned");
        queue.push(id);
        Self::sort_locked(world, &mut queue);
    }

    /// Highest-priority entry without removing it.
    pub fn peek_next(&self, kind: QueueKind) -> Option<AircraftId> {
        self.queue(kind).lock().expect("queue lock poisoned").first().copied()
    }

    /// Remove and return the highest-priority entry.
    pub fn take_next(&self, kind: QueueKind) -> Option<AircraftId> {
        let mut queue = self.queue(kind).lock().expect("queue lock poisoned");
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }

    /// Drop a specific aircraft from its queue (runway-wait timeout path).
    pub fn remove(&self, kind: QueueKind, id: AircraftId) -> bool {
        let mut queue = self.queue(kind).lock().expect("queue lock poisoned");
        match queue.iter().position(|q| *q == id) {
            Some(pos) => {
                queue.remove(pos);
                true
            }
            None => false,
        }
    }

    fn best_emergency(world: &World, queue: &[AircraftId]) -> Option<(usize, i64)> {
        let now = unix_now();
        let mut best: Option<(usize, i64)> = None;
        for (pos, id) in queue.iter().enumerate() {
            let plane = world.get(*id);
            if plane.emergency_level() == 0 {
                continue;
            }
            let score = plane.priority_score(now);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((pos, score));
            }
        }
        best
    }

    /// Highest-priority emergency in either queue, read-only.
    pub fn peek_emergency(&self, world: &World) -> Option<AircraftId> {
        {
            let arrivals = self.arrivals.lock().expect("queue lock poisoned");
            if let Some((pos, _)) = Self::best_emergency(world, &arrivals) {
                return Some(arrivals[pos]);
            }
        }
        let departures = self.departures.lock().expect("queue lock poisoned");
        Self::best_emergency(world, &departures).map(|(pos, _)| departures[pos])
    }

    /// Remove and return the highest-priority emergency in either queue.
    pub fn take_emergency(&self, world: &World) -> Option<AircraftId> {
        {
            let mut arrivals = self.arrivals.lock().expect("queue lock poisoned");
            if let Some((pos, _)) = Self::best_emergency(world, &arrivals) {
                return Some(arrivals.remove(pos));
            }
        }
        let mut departures = self.departures.lock().expect("queue lock poisoned");
        Self::best_emergency(world, &departures).map(|(pos, _)| departures.remove(pos))
    }

    /// Estimated wait for a queued aircraft: position × 2 minutes. `None`
    /// when the aircraft is in neither queue.
    pub fn estimate_wait(&self, id: AircraftId) -> Option<Duration> {
        let position = {
            let arrivals = self.arrivals.lock().expect("queue lock poisoned");
            arrivals.iter().position(|q| *q == id)
        }
        .or_else(|| {
            let departures = self.departures.lock().expect("queue lock poisoned");
            departures.iter().position(|q| *q == id)
        })?;
        Some(WAIT_PER_SLOT * position as u32)
    }

    pub fn queue_len(&self, kind: QueueKind) -> usize {
        self.queue(kind).lock().expect("queue lock poisoned").len()
    }

    /// Current contents of a queue, head first.
    pub fn queue_contents(&self, kind: QueueKind) -> Vec<AircraftId> {
        self.queue(kind).lock().expect("queue lock poisoned").clone()
    }

    /// Every aircraft ever enrolled this run.
    pub fn active_flights(&self) -> Vec<AircraftId> {
        self.active.lock().expect("active lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Aircraft, AircraftClass, Direction};

    fn arrivals_world(classes: &[AircraftClass]) -> World {
        World::new(
            classes
                .iter()
                .enumerate()
                .map(|(i, class)| Aircraft::new(AircraftId(i), "PIA", *class, Direction::North))
                .collect(),
        )
    }

    #[test]
    fn queue_is_sorted_by_descending_score_after_enrollment() {
        let world = arrivals_world(&[
            AircraftClass::Commercial,
            AircraftClass::Medical,
            AircraftClass::Cargo,
        ]);
        let scheduler = FlightScheduler::new();
        for id in world.ids() {
            scheduler.enroll(&world, QueueKind::Arrival, id);
        }

        let queue = scheduler.queue_contents(QueueKind::Arrival);
        let now = unix_now();
        for pair in queue.windows(2) {
            assert!(
                world.get(pair[0]).priority_score(now) >= world.get(pair[1]).priority_score(now)
            );
        }
        // Medical outranks Cargo outranks Commercial.
        assert_eq!(queue, vec![AircraftId(1), AircraftId(2), AircraftId(0)]);
    }

    #[test]
    fn fcfs_breaks_ties_within_a_class() {
        let world = arrivals_world(&[
            AircraftClass::Commercial,
            AircraftClass::Commercial,
            AircraftClass::Commercial,
        ]);
        let scheduler = FlightScheduler::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(1));
        // Backdate #1 and re-sort via the next insertion: the older entry
        // must come out first.
        world.get(AircraftId(1)).stamp_queue_entry(unix_now() - 100);
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(2));

        assert_eq!(scheduler.take_next(QueueKind::Arrival), Some(AircraftId(1)));
        assert_eq!(scheduler.take_next(QueueKind::Arrival), Some(AircraftId(0)));
        assert_eq!(scheduler.take_next(QueueKind::Arrival), Some(AircraftId(2)));
    }

    #[test]
    fn emergency_scan_prefers_arrivals_and_does_not_mutate_on_peek() {
        let world = World::new(vec![
            Aircraft::new(AircraftId(0), "PIA", AircraftClass::Commercial, Direction::North),
            Aircraft::new(AircraftId(1), "PIA", AircraftClass::Commercial, Direction::East),
        ]);
        let scheduler = FlightScheduler::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));
        scheduler.enroll(&world, QueueKind::Departure, AircraftId(1));

        world.get(AircraftId(1)).declare_emergency(3);
        assert_eq!(scheduler.peek_emergency(&world), Some(AircraftId(1)));
        assert_eq!(scheduler.queue_len(QueueKind::Departure), 1);

        // An arrival emergency wins even against a higher departure level.
        world.get(AircraftId(0)).declare_emergency(1);
        assert_eq!(scheduler.peek_emergency(&world), Some(AircraftId(0)));

        assert_eq!(scheduler.take_emergency(&world), Some(AircraftId(0)));
        assert_eq!(scheduler.queue_len(QueueKind::Arrival), 0);
        assert_eq!(scheduler.take_emergency(&world), Some(AircraftId(1)));
        assert_eq!(scheduler.take_emergency(&world), None);
    }

    #[test]
    fn re_enroll_preserves_the_original_stamp() {
        let world = arrivals_world(&[AircraftClass::Commercial]);
        let scheduler = FlightScheduler::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));
        let stamp = world.get(AircraftId(0)).queue_entered_at();

        let taken = scheduler.take_next(QueueKind::Arrival).expect("queued");
        scheduler.re_enroll(&world, QueueKind::Arrival, taken);
        assert_eq!(world.get(AircraftId(0)).queue_entered_at(), stamp);
        // Still exactly once in the queue.
        assert_eq!(scheduler.queue_contents(QueueKind::Arrival), vec![AircraftId(0)]);
    }

    #[test]
    fn estimate_wait_charges_two_minutes_per_slot() {
        let world = arrivals_world(&[AircraftClass::Medical, AircraftClass::Commercial]);
        let scheduler = FlightScheduler::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(1));

        assert_eq!(scheduler.estimate_wait(AircraftId(0)), Some(Duration::ZERO));
        assert_eq!(scheduler.estimate_wait(AircraftId(1)), Some(Duration::from_secs(120)));
        assert_eq!(scheduler.estimate_wait(AircraftId(7)), None);
    }

    #[test]
    fn active_list_tracks_every_enrollment() {
        let world = arrivals_world(&[AircraftClass::Commercial, AircraftClass::Cargo]);
        let scheduler = FlightScheduler::new();
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(0));
        scheduler.enroll(&world, QueueKind::Arrival, AircraftId(1));
        scheduler.take_next(QueueKind::Arrival);

        // Taking from the queue never removes from the active list.
        assert_eq!(scheduler.active_flights(), vec![AircraftId(0), AircraftId(1)]);
    }
}
