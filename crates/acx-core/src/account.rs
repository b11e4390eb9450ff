//! The airline portal's state: received notice summaries and airline
//! accounts.
//!
//! The two collections have independent locks. Whenever both are needed the
//! order is fixed - notices first, accounts second - so the portal cannot
//! deadlock against itself.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::airline::{airline_of_flight, AIRLINES};
use crate::payment::PaymentRequest;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("unknown notice {0}")]
    UnknownNotice(String),
    #[error("notice {0} is already paid")]
    AlreadyPaid(String),
    #[error("no account for airline {0}")]
    UnknownAirline(String),
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("deposit amount must be positive")]
    NonPositiveAmount,
}

/// One airline's running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlineAccount {
    pub balance: i64,
    pub total_fines: i64,
    pub total_paid: i64,
}

/// The summary of a notice as it travels on the notice stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeSummary {
    pub id: String,
    pub flight_number: String,
    pub fine_class: String,
    pub amount: i64,
    pub paid: bool,
}

/// What applying a notice summary did to the portal's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// First sighting of an unpaid notice; the airline's fines grew.
    NewUnpaid,
    /// First sighting, already paid (unusual but accepted).
    NewPaid,
    /// A known notice transitioned unpaid → paid.
    MarkedPaid,
    /// Nothing changed.
    Unchanged,
}

#[derive(Debug)]
pub struct Portal {
    notices: Mutex<Vec<NoticeSummary>>,
    accounts: Mutex<HashMap<String, AirlineAccount>>,
}

impl Default for Portal {
    fn default() -> Self {
        Self::new()
    }
}

impl Portal {
    /// Portal with every registered airline at its opening balance.
    pub fn new() -> Self {
        let accounts = AIRLINES
            .iter()
            .map(|spec| {
                (
                    spec.name.to_string(),
                    AirlineAccount {
                        balance: spec.initial_balance,
                        ..AirlineAccount::default()
                    },
                )
            })
            .collect();
        Self {
            notices: Mutex::new(Vec::new()),
            accounts: Mutex::new(accounts),
        }
    }

    fn airline_for(&self, flight_number: &str) -> Option<String> {
        airline_of_flight(flight_number).map(str::to_string)
    }

    /// Fold a notice summary from the generator into the portal state.
    pub fn apply_update(&self, summary: NoticeSummary) -> UpdateOutcome {
        let mut notices = self.notices.lock().expect("notices lock poisoned");
        if let Some(existing) = notices.iter_mut().find(|n| n.id == summary.id) {
            if !existing.paid && summary.paid {
                existing.paid = true;
                let airline = self.airline_for(&existing.flight_number);
                let amount = existing.amount;
                drop(notices);
                if let Some(airline) = airline {
                    let mut accounts = self.accounts.lock().expect("accounts lock poisoned");
                    if let Some(account) = accounts.get_mut(&airline) {
                        account.total_paid += amount;
                    }
                }
                return UpdateOutcome::MarkedPaid;
            }
            return UpdateOutcome::Unchanged;
        }

        let outcome = if summary.paid {
            UpdateOutcome::NewPaid
        } else {
            UpdateOutcome::NewUnpaid
        };
        let airline = self.airline_for(&summary.flight_number);
        let amount = summary.amount;
        notices.push(summary);
        drop(notices);

        if outcome == UpdateOutcome::NewUnpaid {
            if let Some(airline) = airline {
                let mut accounts = self.accounts.lock().expect("accounts lock poisoned");
                if let Some(account) = accounts.get_mut(&airline) {
                    account.total_fines += amount;
                }
            }
        }
        outcome
    }

    /// Initiate payment of a notice: verify it is known and unpaid, debit
    /// the owning account, and hand back the request to send to the payment
    /// service. The account is only debited when everything checks out.
    pub fn pay(&self, notice_id: &str) -> Result<PaymentRequest, PortalError> {
        let notices = self.notices.lock().expect("notices lock poisoned");
        let summary = notices
            .iter()
            .find(|n| n.id == notice_id)
            .ok_or_else(|| PortalError::UnknownNotice(notice_id.to_string()))?;
        if summary.paid {
            return Err(PortalError::AlreadyPaid(notice_id.to_string()));
        }
        let airline = self
            .airline_for(&summary.flight_number)
            .ok_or_else(|| PortalError::UnknownAirline(summary.flight_number.clone()))?;

        // Lock order: notices (held) then accounts.
        let mut accounts = self.accounts.lock().expect("accounts lock poisoned");
        let account = accounts
            .get_mut(&airline)
            .ok_or(PortalError::UnknownAirline(airline))?;
        if account.balance < summary.amount {
            return Err(PortalError::InsufficientFunds {
                needed: summary.amount,
                available: account.balance,
            });
        }
        account.balance -= summary.amount;

        Ok(PaymentRequest {
            notice_id: summary.id.clone(),
            flight_number: summary.flight_number.clone(),
            fine_class: summary.fine_class.clone(),
            amount_due: summary.amount,
            amount_offered: summary.amount,
        })
    }

    pub fn deposit(&self, airline: &str, amount: i64) -> Result<i64, PortalError> {
        if amount <= 0 {
            return Err(PortalError::NonPositiveAmount);
        }
        let mut accounts = self.accounts.lock().expect("accounts lock poisoned");
        let account = accounts
            .get_mut(airline)
            .ok_or_else(|| PortalError::UnknownAirline(airline.to_string()))?;
        account.balance += amount;
        Ok(account.balance)
    }

    pub fn account(&self, airline: &str) -> Option<AirlineAccount> {
        self.accounts.lock().expect("accounts lock poisoned").get(airline).copied()
    }

    pub fn accounts(&self) -> Vec<(String, AirlineAccount)> {
        let accounts = self.accounts.lock().expect("accounts lock poisoned");
        let mut all: Vec<_> = accounts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn notices(&self) -> Vec<NoticeSummary> {
        self.notices.lock().expect("notices lock poisoned").clone()
    }

    pub fn unpaid_notices(&self) -> Vec<NoticeSummary> {
        let notices = self.notices.lock().expect("notices lock poisoned");
        notices.iter().filter(|n| !n.paid).cloned().collect()
    }
}
