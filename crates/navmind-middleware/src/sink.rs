//! The command-sink seam.
//!
//! The publish loop never speaks directly to an external transport.  It
//! delivers through [`CommandSink`]; implementations decide where the
//! command stream actually goes.  [`BusSink`] is the standard one — it
//! publishes onto the internal [`EventBus`][crate::bus::EventBus], from
//! which adapters such as [`RosbridgeAdapter`][crate::rosbridge::RosbridgeAdapter]
//! translate outward.

use async_trait::async_trait;
use navmind_types::{Event, EventPayload, NavError, VelocityCommand};

use crate::bus::{EventBus, Topic};

/// Destination of the outbound command stream.
///
/// Delivery is best-effort and fire-and-forget: implementations report
/// errors for observability, but callers do not retry.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Deliver one command at the publish cadence.
    async fn deliver(&self, command: &VelocityCommand) -> Result<(), NavError>;
}

/// Sink that publishes commands as [`EventPayload::Velocity`] events on the
/// internal bus.
#[derive(Clone)]
pub struct BusSink {
    bus: EventBus,
    source: String,
}

impl BusSink {
    pub fn new(bus: EventBus, source: impl Into<String>) -> Self {
        Self {
            bus,
            source: source.into(),
        }
    }
}

#[async_trait]
impl CommandSink for BusSink {
    async fn deliver(&self, command: &VelocityCommand) -> Result<(), NavError> {
        let event = Event::now(self.source.as_str(), EventPayload::Velocity(*command));
        // No subscribers is a normal condition for a broadcast stream.
        match self.bus.publish_to(Topic::VelocityCommands, event) {
            Ok(_) | Err(NavError::Channel(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
