//! The simulator process: flight tasks, the ATC loop, the radar loop, and
//! the driver that wires them to the pipeline processes.

pub mod atc;
pub mod driver;
pub mod flight;
pub mod radar;
