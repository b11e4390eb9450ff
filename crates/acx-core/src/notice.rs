//! Violation notices and the generator's notice store.

use std::sync::Mutex;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bands::SpeedBand;
use crate::models::AircraftClass;

/// Seconds between issue and due time: three days.
pub const DUE_OFFSET_SECS: i64 = 3 * 86_400;

/// Fine classification. The fine schedule only distinguishes commercial and
/// cargo traffic; military, medical and emergency aircraft are all billed at
/// the emergency rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FineClass {
    Commercial,
    Cargo,
    Emergency,
}

impl FineClass {
    pub fn from_aircraft_class(class: AircraftClass) -> Self {
        match class {
            AircraftClass::Commercial => FineClass::Commercial,
            AircraftClass::Cargo => FineClass::Cargo,
            AircraftClass::Military | AircraftClass::Medical | AircraftClass::Emergency => {
                FineClass::Emergency
            }
        }
    }

    pub fn fine_amount(self) -> i64 {
        match self {
            FineClass::Commercial => 500_000,
            FineClass::Cargo | FineClass::Emergency => 700_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FineClass::Commercial => "Commercial",
            FineClass::Cargo => "Cargo",
            FineClass::Emergency => "Emergency",
        }
    }

}

/// 15% administrative fee, rounded down.
pub fn service_fee(fine: i64) -> i64 {
    fine * 15 / 100
}

/// One administrative violation notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub flight_number: String,
    pub airline: String,
    pub fine_class: FineClass,
    pub observed_speed: i32,
    pub allowed: SpeedBand,
    pub issued_at: i64,
    pub due_at: i64,
    pub fine: i64,
    pub service_fee: i64,
    pub total: i64,
    pub paid: bool,
}

impl Notice {
    /// Issue a notice at `now` (epoch seconds) for one observed violation.
    pub fn issue<R: Rng>(
        flight_number: &str,
        airline: &str,
        fine_class: FineClass,
        observed_speed: i32,
        allowed: SpeedBand,
        now: i64,
        rng: &mut R,
    ) -> Self {
        let fine = fine_class.fine_amount();
        let fee = service_fee(fine);
        Self {
            id: generate_notice_id(now, rng),
            flight_number: flight_number.to_string(),
            airline: airline.to_string(),
            fine_class,
            observed_speed,
            allowed,
            issued_at: now,
            due_at: now + DUE_OFFSET_SECS,
            fine,
            service_fee: fee,
            total: fine + fee,
            paid: false,
        }
    }

    /// Flip the paid flag, false → true only. Returns whether it flipped.
    pub fn mark_paid(&mut self) -> bool {
        if self.paid {
            false
        } else {
            self.paid = true;
            true
        }
    }
}

/// `AVN-YYYYMMDD-XXXX`: date of issue plus a random four-digit suffix.
fn generate_notice_id<R: Rng>(now: i64, rng: &mut R) -> String {
    let date = chrono::DateTime::from_timestamp(now, 0)
        .map(|dt| dt.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "00000000".to_string());
    format!("AVN-{}-{}", date, rng.gen_range(1000..=9999))
}

/// Outcome of applying a payment confirmation to the store.
#[derive(Debug, Clone)]
pub enum PaidOutcome {
    /// The flag flipped; here is the updated notice.
    Flipped(Notice),
    /// The notice was already paid; nothing changed.
    AlreadyPaid(Notice),
    /// No notice with that id.
    Unknown,
}

/// The notice generator's list of issued notices, behind a local lock.
/// Cross-process exclusion around paid-flag flips is the caller's business.
#[derive(Debug, Default)]
pub struct NoticeStore {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notice. Returns false when the id already exists (the
    /// random suffix collided); the caller decides how loudly to complain.
    pub fn push(&self, notice: Notice) -> bool {
        let mut notices = self.notices.lock().expect("notice lock poisoned");
        let fresh = !notices.iter().any(|n| n.id == notice.id);
        notices.push(notice);
        fresh
    }

    /// Apply a payment confirmation to the first notice with `id`.
    pub fn mark_paid(&self, id: &str) -> PaidOutcome {
        let mut notices = self.notices.lock().expect("notice lock poisoned");
        match notices.iter_mut().find(|n| n.id == id) {
            Some(notice) => {
                if notice.mark_paid() {
                    PaidOutcome::Flipped(notice.clone())
                } else {
                    PaidOutcome::AlreadyPaid(notice.clone())
                }
            }
            None => PaidOutcome::Unknown,
        }
    }

    pub fn find(&self, id: &str) -> Option<Notice> {
        let notices = self.notices.lock().expect("notice lock poisoned");
        notices.iter().find(|n| n.id == id).cloned()
    }

    pub fn by_airline(&self, airline: &str) -> Vec<Notice> {
        let notices = self.notices.lock().expect("notice lock poisoned");
        notices.iter().filter(|n| n.airline == airline).cloned().collect()
    }

    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().expect("notice lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().expect("notice lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn sample_notice(rng: &mut StdRng) -> Notice {
        Notice::issue(
            "PIA-1",
            "PIA",
            FineClass::Commercial,
            650,
            SpeedBand { min: 400, max: 600 },
            1_700_000_000,
            rng,
        )
    }

    #[test]
    fn fine_formula_holds_for_every_class() {
        for class in [FineClass::Commercial, FineClass::Cargo, FineClass::Emergency] {
            let fine = class.fine_amount();
            assert!(fine == 500_000 || fine == 700_000);
            assert_eq!(service_fee(fine), fine * 15 / 100);
        }
        assert_eq!(FineClass::Commercial.fine_amount(), 500_000);
        assert_eq!(FineClass::Cargo.fine_amount(), 700_000);
        assert_eq!(FineClass::Emergency.fine_amount(), 700_000);
    }

    #[test]
    fn issued_notice_totals_fine_plus_fee_and_dues_in_three_days() {
        let mut rng = StdRng::seed_from_u64(1);
        let notice = sample_notice(&mut rng);
        assert_eq!(notice.fine, 500_000);
        assert_eq!(notice.service_fee, 75_000);
        assert_eq!(notice.total, 575_000);
        assert_eq!(notice.due_at - notice.issued_at, 3 * 86_400);
        assert!(!notice.paid);
    }

    #[test]
    fn notice_id_carries_the_issue_date() {
        let mut rng = StdRng::seed_from_u64(2);
        let notice = sample_notice(&mut rng);
        // 1_700_000_000 is 2023-11-14 UTC.
        assert!(notice.id.starts_with("AVN-20231114-"), "id was {}", notice.id);
        let suffix = notice.id.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn paid_flips_false_to_true_exactly_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let store = NoticeStore::new();
        let notice = sample_notice(&mut rng);
        let id = notice.id.clone();
        assert!(store.push(notice));

        match store.mark_paid(&id) {
            PaidOutcome::Flipped(n) => assert!(n.paid),
            other => panic!("expected flip, got {:?}", other),
        }
        assert!(matches!(store.mark_paid(&id), PaidOutcome::AlreadyPaid(_)));
        assert!(matches!(store.mark_paid("AVN-00000000-0000"), PaidOutcome::Unknown));
    }

    #[test]
    fn notices_can_be_looked_up_by_id_and_airline() {
        let mut rng = StdRng::seed_from_u64(8);
        let store = NoticeStore::new();
        let pia = sample_notice(&mut rng);
        let fedex = Notice::issue(
            "FedEx-4",
            "FedEx",
            FineClass::Cargo,
            300,
            SpeedBand { min: 240, max: 290 },
            1_700_000_000,
            &mut rng,
        );
        store.push(pia.clone());
        store.push(fedex.clone());

        assert_eq!(store.find(&fedex.id).unwrap().airline, "FedEx");
        assert!(store.find("AVN-00000000-0000").is_none());
        let pia_notices = store.by_airline("PIA");
        assert_eq!(pia_notices.len(), 1);
        assert_eq!(pia_notices[0].id, pia.id);
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn duplicate_ids_are_reported_on_push() {
        let mut rng = StdRng::seed_from_u64(4);
        let store = NoticeStore::new();
        let notice = sample_notice(&mut rng);
        let mut dup = sample_notice(&mut rng);
        dup.id = notice.id.clone();
        assert!(store.push(notice));
        assert!(!store.push(dup));
        assert_eq!(store.len(), 2);
    }
}
