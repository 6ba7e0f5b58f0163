//! Rosbridge-style outbound frame adapter.
//!
//! [`RosbridgeAdapter`] subscribes to [`Topic::VelocityCommands`] and renders
//! every command as a rosbridge `publish` frame carrying a
//! `geometry_msgs/msg/Twist` payload:
//!
//! ```json
//! {"op":"publish","topic":"/cmd_vel","msg":{"linear":{...},"angular":{...}}}
//! ```
//!
//! Frame delivery beyond this boundary (a websocket, a serial link) is the
//! deployment's concern; here each frame is emitted on the debug log.

use navmind_types::{EventPayload, VelocityCommand};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::bus::{EventBus, Topic};

/// Translates the internal velocity stream into rosbridge Twist frames.
pub struct RosbridgeAdapter {
    bus: EventBus,
    command_topic: String,
}

impl RosbridgeAdapter {
    /// Create an adapter publishing frames for `command_topic`
    /// (e.g. `"/cmd_vel"`).
    pub fn new(bus: EventBus, command_topic: impl Into<String>) -> Self {
        Self {
            bus,
            command_topic: command_topic.into(),
        }
    }

    /// Render one command as a rosbridge `publish` frame.
    pub fn frame(&self, command: &VelocityCommand) -> String {
        json!({
            "op": "publish",
            "topic": self.command_topic,
            "msg": {
                "linear":  { "x": command.linear.x,  "y": command.linear.y,  "z": command.linear.z },
                "angular": { "x": command.angular.x, "y": command.angular.y, "z": command.angular.z }
            }
        })
        .to_string()
    }

    /// Consume the velocity stream until the bus closes, rendering one frame
    /// per command.  Lag is logged and skipped over; commands dropped while
    /// lagging are superseded by newer ones anyway.
    pub async fn run(self) {
        let mut rx = self.bus.subscribe_to(Topic::VelocityCommands);
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let EventPayload::Velocity(command) = event.payload {
                        debug!(frame = %self.frame(&command), "rosbridge frame");
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "rosbridge adapter lagged behind the command stream");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navmind_types::Vector3;

    #[test]
    fn frame_carries_topic_and_twist_fields() {
        let adapter = RosbridgeAdapter::new(EventBus::default(), "/cmd_vel");
        let command = VelocityCommand {
            linear: Vector3::new(0.6, 0.0, 0.0),
            angular: Vector3::new(0.0, 0.0, -1.2),
        };

        let frame = adapter.frame(&command);
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(parsed["op"], "publish");
        assert_eq!(parsed["topic"], "/cmd_vel");
        assert_eq!(parsed["msg"]["linear"]["x"], 0.6);
        assert_eq!(parsed["msg"]["angular"]["z"], -1.2);
    }

    #[test]
    fn frame_for_zero_command_is_all_zeros() {
        let adapter = RosbridgeAdapter::new(EventBus::default(), "/cmd_vel");
        let frame = adapter.frame(&VelocityCommand::zero());
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["msg"]["linear"]["x"], 0.0);
        assert_eq!(parsed["msg"]["linear"]["y"], 0.0);
        assert_eq!(parsed["msg"]["angular"]["z"], 0.0);
    }
}
