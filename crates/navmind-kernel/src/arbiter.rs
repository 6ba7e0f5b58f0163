//! [`CommandArbiter`] – the watchdogged command slot.
//!
//! Holds exactly one [`VelocityCommand`] together with the instant it was
//! last refreshed.  Instruction handling writes into the slot; the publish
//! loop reads from it.  On every read the arbiter derives whether the held
//! command is still *fresh* (age within the hold window) or *stale* — stale
//! reads tell the caller to substitute the zero command, which is how the
//! system fails safe when no directive has arrived for too long.
//!
//! All three operations take the internal mutex for an O(1) swap only; the
//! lock is never held across I/O, so a remote call that blocks for its full
//! timeout cannot delay a publish tick.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use navmind_types::VelocityCommand;

// ────────────────────────────────────────────────────────────────────────────
// Internal slot
// ────────────────────────────────────────────────────────────────────────────

struct Slot {
    command: VelocityCommand,
    /// `None` plays the role of the epoch: the slot has never been refreshed
    /// (or was reset), so it is stale at every possible read time.
    last_update: Option<Instant>,
}

// ────────────────────────────────────────────────────────────────────────────
// CommandArbiter
// ────────────────────────────────────────────────────────────────────────────

/// Lock-guarded holder of the current command and its last-update instant.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use navmind_kernel::CommandArbiter;
/// use navmind_types::VelocityCommand;
///
/// let arbiter = CommandArbiter::new(Duration::from_millis(1500));
///
/// let now = Instant::now();
/// arbiter.set(VelocityCommand::zero(), now);
/// let (_, fresh) = arbiter.read(now);
/// assert!(fresh);
/// ```
pub struct CommandArbiter {
    slot: Mutex<Slot>,
    hold: Duration,
}

impl CommandArbiter {
    /// Create an arbiter whose held commands expire after `hold`.
    ///
    /// The slot starts out with the zero command and no update time, so the
    /// very first read is stale.
    pub fn new(hold: Duration) -> Self {
        Self {
            slot: Mutex::new(Slot {
                command: VelocityCommand::zero(),
                last_update: None,
            }),
            hold,
        }
    }

    /// The configured hold window.
    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Atomically replace the slot with `command`, refreshed at `now`.
    ///
    /// No validation happens here — the command is assumed to be already
    /// clamped.  Always overwrites: when two instruction tasks race, the one
    /// that completes last wins, regardless of which directive arrived first.
    pub fn set(&self, command: VelocityCommand, now: Instant) {
        let mut slot = self.slot.lock().expect("arbiter mutex poisoned");
        slot.command = command;
        slot.last_update = Some(now);
    }

    /// Atomically install the zero command with no update time.
    ///
    /// Every subsequent read is stale until the next [`set`][Self::set], so
    /// the publish loop keeps emitting zero no matter when it ticks.
    pub fn reset(&self) {
        let mut slot = self.slot.lock().expect("arbiter mutex poisoned");
        slot.command = VelocityCommand::zero();
        slot.last_update = None;
    }

    /// Snapshot the slot and derive its freshness at `now`.
    ///
    /// Returns the held command and `true` when its age is within the hold
    /// window.  An age of exactly the hold duration still counts as fresh;
    /// anything over is stale.  A slot that was never set (or was reset) is
    /// always stale.
    pub fn read(&self, now: Instant) -> (VelocityCommand, bool) {
        let slot = self.slot.lock().expect("arbiter mutex poisoned");
        let fresh = match slot.last_update {
            Some(at) => now.saturating_duration_since(at) <= self.hold,
            None => false,
        };
        (slot.command, fresh)
    }
}
