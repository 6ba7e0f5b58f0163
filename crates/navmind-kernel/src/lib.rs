//! `navmind-kernel` – Safety Core
//!
//! The only shared mutable state in the system lives here. It does not plan;
//! it holds the current command and decides whether it is still trustworthy.
//!
//! # Modules
//!
//! - [`arbiter`] – [`CommandArbiter`][arbiter::CommandArbiter]:
//!   the lock-guarded slot for "current command + time of last valid update".
//!   Freshness is derived on every read against the configured hold window,
//!   so a silent planner automatically degrades to a zero command without any
//!   explicit timeout plumbing in the callers.

pub mod arbiter;

pub use arbiter::CommandArbiter;
