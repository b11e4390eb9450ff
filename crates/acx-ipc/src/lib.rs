//! AirControlX inter-process plumbing.
//!
//! Everything the four processes need to talk to each other: the
//! fixed-width wire frames, the Unix-socket endpoints, and the
//! cross-process lock around paid-flag flips. Domain logic stays in
//! `acx-core`; this crate owns the bytes.

pub mod endpoint;
pub mod lock;
pub mod wire;

pub use endpoint::{accept_one, bind, connect_with_retry, SocketDir};
pub use lock::{CrossProcessLock, LockError, LockGuard};
pub use wire::{PaymentFrame, ViolationFrame, WireError, PAYMENT_FRAME_LEN, VIOLATION_FRAME_LEN};
