//! `navmind-middleware` – The Nervous System
//!
//! Routes directives and velocity commands between the runtime, the safety
//! kernel, and the outside world without caring about their meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.
//! - [`sink`] – The [`CommandSink`][sink::CommandSink] seam the publish loop
//!   emits through, plus the bus-backed implementation.
//! - [`rosbridge`] – Renders the outbound command stream as rosbridge-style
//!   Twist JSON frames for external consumers.

pub mod bus;
pub mod rosbridge;
pub mod sink;

pub use bus::{EventBus, Topic, TopicReceiver};
pub use rosbridge::RosbridgeAdapter;
pub use sink::{BusSink, CommandSink};
