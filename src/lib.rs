//! AirControlX - automated air traffic control simulation.
//!
//! This crate wires the pure logic of `acx-core` and the IPC plumbing of
//! `acx-ipc` into the four cooperating processes: the simulator itself and
//! the notice generator, airline portal and payment service it spawns.

pub mod config;
pub mod services;
pub mod shutdown;
pub mod sim;
pub mod snapshot;

pub use config::Config;
