//! The three pipeline processes spawned by the simulator: the notice
//! generator, the airline portal, and the payment service. Each runs the
//! same shape of loop: bind the streams it reads, connect to the peers it
//! writes, then fold frames into its state until EOF or SIGTERM.

pub mod avn;
pub mod payment;
pub mod portal;
