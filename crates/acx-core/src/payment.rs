//! The payment service's pending queue and history.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A payment awaiting approval, as queued by the payment service. Also the
/// shape of the request the portal emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub notice_id: String,
    pub flight_number: String,
    pub fine_class: String,
    pub amount_due: i64,
    pub amount_offered: i64,
}

/// Pending payments and the approval history.
#[derive(Debug, Default)]
pub struct PaymentDesk {
    pending: Mutex<VecDeque<PaymentRequest>>,
    history: Mutex<Vec<PaymentRequest>>,
}

impl PaymentDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, request: PaymentRequest) {
        self.pending.lock().expect("pending lock poisoned").push_back(request);
    }

    /// Approve the pending payment at `index` (0-based). The request moves
    /// to the history and is returned for confirmation.
    pub fn approve(&self, index: usize) -> Option<PaymentRequest> {
        let approved = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            pending.remove(index)?
        };
        self.history.lock().expect("history lock poisoned").push(approved.clone());
        Some(approved)
    }

    pub fn pending(&self) -> Vec<PaymentRequest> {
        self.pending.lock().expect("pending lock poisoned").iter().cloned().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("pending lock poisoned").len()
    }

    pub fn history(&self) -> Vec<PaymentRequest> {
        self.history.lock().expect("history lock poisoned").clone()
    }
}

/// `TXPAY-YYYYMMDD-NNNNNN`: transaction id logged with each approval.
pub fn transaction_id<R: Rng>(now: i64, rng: &mut R) -> String {
    let date = chrono::DateTime::from_timestamp(now, 0)
        .map(|dt| dt.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "00000000".to_string());
    format!("TXPAY-{}-{}", date, rng.gen_range(100_000..=999_999))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn request(id: &str) -> PaymentRequest {
        PaymentRequest {
            notice_id: id.to_string(),
            flight_number: "PIA-1".to_string(),
            fine_class: "Commercial".to_string(),
            amount_due: 575_000,
            amount_offered: 575_000,
        }
    }

    #[test]
    fn approval_moves_a_request_to_the_history() {
        let desk = PaymentDesk::new();
        desk.enqueue(request("AVN-20250101-1111"));
        desk.enqueue(request("AVN-20250101-2222"));

        let approved = desk.approve(1).expect("second request");
        assert_eq!(approved.notice_id, "AVN-20250101-2222");
        assert_eq!(desk.pending_len(), 1);
        assert_eq!(desk.pending()[0].notice_id, "AVN-20250101-1111");
        assert_eq!(desk.history().len(), 1);
        assert!(desk.approve(5).is_none());
    }

    #[test]
    fn transaction_ids_are_date_stamped() {
        let mut rng = StdRng::seed_from_u64(9);
        let id = transaction_id(1_700_000_000, &mut rng);
        assert!(id.starts_with("TXPAY-20231114-"), "id was {}", id);
    }
}
