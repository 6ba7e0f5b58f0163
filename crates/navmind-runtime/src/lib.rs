//! `navmind-runtime` – The Planning Engine
//!
//! Turns inbound natural-language directives into bounded velocity commands
//! and keeps the outbound command stream alive on a fixed cadence.
//!
//! # Modules
//!
//! - [`bridge`] – [`MotionBridge`][bridge::MotionBridge]:
//!   the orchestrator.  Owns the [`CommandArbiter`][navmind_kernel::CommandArbiter],
//!   drives the instruction pipeline (complete → extract → clamp → set), runs
//!   the fixed-rate publish loop, and exposes the explicit stop operation.
//! - [`completion`] – [`CompletionClient`][completion::CompletionClient]:
//!   an OpenAI-compatible chat-completions client.  One attempt per
//!   directive, caller-configured timeout, optional bearer auth, and an
//!   optional structured-output hint built from the
//!   [`VelocityPayload`][navmind_types::VelocityPayload] JSON Schema.
//! - [`extract`] – [`extract_payload`][extract::extract_payload]:
//!   locates and parses the JSON object embedded in a possibly-wrapped
//!   completion response.
//! - [`clamp`] – [`clamp_velocity`][clamp::clamp_velocity]:
//!   pure per-axis saturation of an untrusted payload into a
//!   [`VelocityCommand`][navmind_types::VelocityCommand].  Never fails; bad
//!   input degrades to zero components.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace
//!   export to an OTLP-compatible collector.

pub mod bridge;
pub mod clamp;
pub mod completion;
pub mod extract;
pub mod telemetry;

pub use bridge::{BridgeConfig, MotionBridge};
pub use clamp::{clamp_axis, clamp_velocity};
pub use completion::{CompletionClient, CompletionError, CompletionOptions, DEFAULT_SYSTEM_PROMPT};
pub use extract::extract_payload;
pub use telemetry::{TracerProviderGuard, init_tracing};

// Re-export the arbiter so orchestration code can hold and wire it without an
// additional explicit dependency on navmind-kernel.
pub use navmind_kernel::CommandArbiter;
