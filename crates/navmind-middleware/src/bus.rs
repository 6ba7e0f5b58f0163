//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! Traffic is partitioned into three [`Topic`] lanes so components only
//! receive the messages they care about:
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Instructions`] | Inbound natural-language directives |
//! | [`Topic::VelocityCommands`] | The fixed-cadence outbound command stream |
//! | [`Topic::SystemAlerts`] | Faults, stop notices, planner remarks, shutdown events |

use navmind_types::{Event, NavError};
use tokio::sync::broadcast;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Enumeration of all first-class routing topics on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Push-based directive feed consumed by the instruction handler.
    Instructions,
    /// Velocity commands emitted on the publish cadence.
    VelocityCommands,
    /// Faults, explicit-stop notices, planner remarks, operator shutdown alerts.
    SystemAlerts,
}

/// Shared event bus.  Clone it cheaply – all clones share the same
/// underlying broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    instructions: broadcast::Sender<Event>,
    velocity_commands: broadcast::Sender<Event>,
    system_alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (instructions, _) = broadcast::channel(capacity);
        let (velocity_commands, _) = broadcast::channel(capacity);
        let (system_alerts, _) = broadcast::channel(capacity);
        Self {
            instructions,
            velocity_commands,
            system_alerts,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event, or
    /// [`NavError::Channel`] when no subscriber is currently listening.
    /// Fire-and-forget publishers (the publish loop, fault reporting) ignore
    /// the error; having no listener is a normal condition for them.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, NavError> {
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| NavError::Channel(format!("no subscribers for topic {topic:?}")))
    }

    /// Subscribe to a specific [`Topic`] channel.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Instructions => &self.instructions,
            Topic::VelocityCommands => &self.velocity_commands,
            Topic::SystemAlerts => &self.system_alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The caller decides whether to
    ///   continue or abort.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navmind_types::{EventPayload, VelocityCommand};

    fn make_event(source: &str) -> Event {
        Event::now(source, EventPayload::Velocity(VelocityCommand::zero()))
    }

    #[tokio::test]
    async fn publish_and_receive() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Topic::VelocityCommands);

        let event = make_event("navmind-runtime::bridge");
        bus.publish_to(Topic::VelocityCommands, event.clone())?;

        let received = rx.recv().await?;
        assert_eq!(received.id, event.id);
        assert_eq!(received.source, event.source);
        Ok(())
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe_to(Topic::Instructions);
        let mut rx2 = bus.subscribe_to(Topic::Instructions);

        let event = make_event("navmind-cli::repl");
        bus.publish_to(Topic::Instructions, event.clone())?;

        assert_eq!(rx1.recv().await?.id, event.id);
        assert_eq!(rx2.recv().await?.id, event.id);
        Ok(())
    }

    #[test]
    fn publish_with_no_subscribers_returns_error() {
        let bus = EventBus::default();
        let result = bus.publish_to(Topic::SystemAlerts, make_event("test"));
        assert!(matches!(result, Err(NavError::Channel(_))));
    }

    /// A subscriber on `SystemAlerts` must not receive events published to
    /// `VelocityCommands` because they are routed through separate channels.
    #[tokio::test]
    async fn subscriber_does_not_receive_other_topic_events() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut alerts_rx = bus.subscribe_to(Topic::SystemAlerts);

        // A subscriber on the published topic so publish_to succeeds.
        let _velocity_rx = bus.subscribe_to(Topic::VelocityCommands);
        bus.publish_to(Topic::VelocityCommands, make_event("navmind-runtime::bridge"))?;

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            alerts_rx.recv(),
        )
        .await;

        assert!(
            result.is_err(),
            "SystemAlerts subscriber must not receive a VelocityCommands event"
        );
        Ok(())
    }

    /// Flooding a low-capacity channel while a subscriber sleeps must produce
    /// a `Lagged` error rather than panicking or blocking.
    #[tokio::test]
    async fn channel_lag_on_slow_subscriber() {
        const CAPACITY: usize = 64;
        let bus = EventBus::new(CAPACITY);
        let mut slow_rx = bus.subscribe_to(Topic::VelocityCommands);

        for _ in 0..10_000 {
            let _ = bus.publish_to(Topic::VelocityCommands, make_event("flood"));
        }

        let result = slow_rx.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
    }

    #[test]
    fn receiver_reports_its_topic() {
        let bus = EventBus::default();
        let rx = bus.subscribe_to(Topic::Instructions);
        assert_eq!(rx.topic(), Topic::Instructions);
    }
}
