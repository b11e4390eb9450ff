//! AirControlX core - flight state, scheduling and allocation logic.
//!
//! This crate contains the domain models and business logic with NO
//! networking dependencies:
//!
//! - **models**: the aircraft arena, phases, directions, classes
//! - **bands**: phase-specific speed sampling and legal bands
//! - **airline**: the airline registry and fleet construction
//! - **scheduler**: the two priority queues and the emergency scan
//! - **runway**: the three-runway occupancy board
//! - **allocator**: one ATC allocation pass
//! - **notice**: violation notices, fines, the generator's store
//! - **account**: the airline portal's notices and accounts
//! - **payment**: the payment service's pending queue
//!
//! All money values are plain `i64` amounts.

pub mod account;
pub mod airline;
pub mod allocator;
pub mod bands;
pub mod models;
pub mod notice;
pub mod payment;
pub mod runway;
pub mod scheduler;

pub use account::{AirlineAccount, NoticeSummary, Portal, PortalError, UpdateOutcome};
pub use allocator::{run_pass, Assignment, AssignmentReason};
pub use bands::{is_violation, legal_band, sample_speed, SpeedBand};
pub use models::{
    unix_now, Aircraft, AircraftClass, AircraftId, AircraftSnapshot, Direction, FlightPhase, World,
};
pub use notice::{FineClass, Notice, NoticeStore, PaidOutcome};
pub use payment::{transaction_id, PaymentDesk, PaymentRequest};
pub use runway::{RunwayBoard, RunwayCategory, RunwayId, RunwaySnapshot};
pub use scheduler::{FlightScheduler, QueueKind};
