use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Three orthogonal axis components, in m/s (linear) or rad/s (angular).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Vector3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A bounded six-component velocity command ready for motion execution.
///
/// Produced exclusively by the command clamp, which guarantees that
/// `linear.z`, `angular.x` and `angular.y` are zero and that the remaining
/// axes respect the configured [`SpeedLimits`].  Consumers treat the value
/// as read-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl VelocityCommand {
    /// The all-zero command used for fail-safe reversion and explicit stops.
    pub fn zero() -> Self {
        Self::default()
    }

    /// `true` when every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-axis speed caps, fixed for the process lifetime.
///
/// A limit ≤ 0 fully disables its axis: the clamp forces the component to
/// zero regardless of what the planner requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimits {
    /// Cap on `linear.x` (forward/backward), m/s.
    pub max_linear: f64,
    /// Cap on `linear.y` (sideways), m/s.  Only honoured when
    /// `allow_lateral` is set.
    pub max_lateral: f64,
    /// Cap on `angular.z` (yaw), rad/s.
    pub max_angular: f64,
    /// Whether the platform supports lateral motion at all.  When `false`,
    /// `linear.y` is forced to zero independent of `max_lateral`.
    pub allow_lateral: bool,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            max_linear: 0.6,
            max_lateral: 0.2,
            max_angular: 1.2,
            allow_lateral: false,
        }
    }
}

/// The strict reply schema the remote planner is instructed to produce.
///
/// Only used to derive the JSON Schema injected as a structured-output hint;
/// actual replies are parsed tolerantly from `serde_json::Value` so a
/// misbehaving model degrades to a zero command instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VelocityPayload {
    #[serde(default)]
    pub linear: Vector3,
    #[serde(default)]
    pub angular: Vector3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Response of the explicit stop operation.  `success` is always `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
}

/// Unified event wrapper for the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "navmind-runtime::bridge"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Build an event stamped with a fresh id and the current wall-clock time.
    pub fn now(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// An inbound natural-language directive.
    Instruction(String),
    /// A velocity command emitted on the publish cadence.
    Velocity(VelocityCommand),
    /// The planner's optional human-readable remark (observability only).
    PlannerNote(String),
    /// A fault or operator-initiated alert.
    Fault { component: String, message: String },
}

/// Global error type spanning bus delivery and configuration failures.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum NavError {
    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}
