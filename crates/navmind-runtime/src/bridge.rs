//! [`MotionBridge`] – the command-arbitration orchestrator.
//!
//! Wires the instruction pipeline to the safety kernel:
//!
//! 1. **Plan** – an inbound directive is sent to the
//!    [`CompletionClient`], the reply's embedded JSON is located by
//!    [`extract_payload`], and [`clamp_velocity`] bounds it into a
//!    [`VelocityCommand`].
//! 2. **Arm** – the clamped command is written into the
//!    [`CommandArbiter`] with the current instant.
//! 3. **Publish** – an independent fixed-rate loop reads the arbiter every
//!    tick and delivers either the held command (while fresh) or the zero
//!    command (once stale) to the command sink.
//!
//! Any failure along the plan step collapses to the fail-safe path: the
//! arbiter is reset and a zero command is emitted immediately, without
//! waiting for the next publish tick.  The explicit stop operation and
//! process shutdown take exactly the same path.
//!
//! # Concurrency
//!
//! Directive handling and publishing only meet inside the arbiter, whose
//! lock covers the {command, timestamp} pair as a unit and is never held
//! across I/O.  Overlapping directives are handled as independent tasks with
//! no queueing: when two remote calls race, whichever completes last wins
//! the slot — even if its directive was issued first.  This mirrors the
//! platform's established behavior and is deliberate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use navmind_kernel::CommandArbiter;
use navmind_middleware::{BusSink, CommandSink, EventBus, Topic};
use navmind_types::{Event, EventPayload, SpeedLimits, StopResponse, VelocityCommand};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clamp::clamp_velocity;
use crate::completion::{CompletionClient, CompletionError, CompletionOptions};
use crate::extract::extract_payload;

/// Source tag stamped on every event this module publishes.
const SOURCE: &str = "navmind-runtime::bridge";

/// Fallback cadence when the configured publish rate is unusable.
const DEFAULT_PUBLISH_RATE_HZ: f64 = 5.0;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`MotionBridge`].
///
/// No `Debug` impl: `api_key` must not reach log output.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Fully-resolved completions endpoint URL.
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    /// Empty selects the built-in system prompt.
    pub system_prompt: String,
    /// Structured-output hint (see [`CompletionOptions::response_format`]).
    pub response_format: String,
    pub api_key: String,
    pub api_key_header: String,
    pub request_timeout: Duration,
    /// Publish cadence in Hz; the loop period is its reciprocal.
    pub publish_rate: f64,
    /// Maximum age a held command may reach before publish ticks substitute
    /// the zero command.
    pub hold_duration: Duration,
    pub limits: SpeedLimits,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.1,
            system_prompt: String::new(),
            response_format: "json_object".to_string(),
            api_key: String::new(),
            api_key_header: "Authorization".to_string(),
            request_timeout: Duration::from_secs(20),
            publish_rate: DEFAULT_PUBLISH_RATE_HZ,
            hold_duration: Duration::from_millis(1500),
            limits: SpeedLimits::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MotionBridge
// ─────────────────────────────────────────────────────────────────────────────

/// Orchestrator owning the arbiter, the completion client, and the bus.
///
/// Cheap to clone; clones share the same arbiter and bus, so a clone handed
/// to a spawned task observes the same command slot.
#[derive(Clone)]
pub struct MotionBridge {
    client: CompletionClient,
    limits: SpeedLimits,
    arbiter: Arc<CommandArbiter>,
    bus: EventBus,
    sink: Arc<dyn CommandSink>,
    publish_period: Duration,
}

impl MotionBridge {
    /// Construct a bridge and its private event bus from `config`.
    pub fn new(config: BridgeConfig) -> Self {
        let rate = if config.publish_rate > 0.0 {
            config.publish_rate
        } else {
            warn!(
                configured = config.publish_rate,
                fallback = DEFAULT_PUBLISH_RATE_HZ,
                "publish rate must be positive; using fallback"
            );
            DEFAULT_PUBLISH_RATE_HZ
        };

        let client = CompletionClient::new(CompletionOptions {
            endpoint: config.endpoint,
            model: config.model,
            temperature: config.temperature,
            system_prompt: config.system_prompt,
            response_format: config.response_format,
            timeout: config.request_timeout,
            api_key: config.api_key,
            api_key_header: config.api_key_header,
        });

        let bus = EventBus::default();
        let sink: Arc<dyn CommandSink> = Arc::new(BusSink::new(bus.clone(), SOURCE));

        Self {
            client,
            limits: config.limits,
            arbiter: Arc::new(CommandArbiter::new(config.hold_duration)),
            bus,
            sink,
            publish_period: Duration::from_secs_f64(1.0 / rate),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors (for tests / external wiring)
    // -------------------------------------------------------------------------

    /// Return a clone of the internal [`EventBus`] so callers can publish
    /// directives and subscribe to the command stream.
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    /// Shared handle to the command arbiter.
    pub fn arbiter(&self) -> Arc<CommandArbiter> {
        Arc::clone(&self.arbiter)
    }

    // -------------------------------------------------------------------------
    // Instruction handling
    // -------------------------------------------------------------------------

    /// Process one inbound directive end to end.
    ///
    /// Empty or whitespace-only directives are ignored without error.  On
    /// any planning failure the arbiter is reset and a zero command goes out
    /// immediately; the error never propagates.
    pub async fn handle_instruction(&self, directive: &str) {
        let directive = directive.trim();
        if directive.is_empty() {
            debug!("ignoring empty directive");
            return;
        }

        info!(directive, "forwarding directive to the planner");
        let (command, comment) = match self.plan(directive).await {
            Ok(planned) => planned,
            Err(e) => {
                warn!(error = %e, "planner request failed; applying fail-safe stop");
                self.apply_stop().await;
                return;
            }
        };

        self.arbiter.set(command, Instant::now());

        if let Some(note) = comment {
            info!(note = %note, "planner comment");
            let _ = self
                .bus
                .publish_to(Topic::SystemAlerts, Event::now(SOURCE, EventPayload::PlannerNote(note)));
        }
    }

    /// One completion attempt: complete → extract → clamp.
    async fn plan(
        &self,
        directive: &str,
    ) -> Result<(VelocityCommand, Option<String>), CompletionError> {
        let raw = self.client.complete(directive).await?;
        let payload = extract_payload(&raw)?;
        Ok(clamp_velocity(&payload, &self.limits))
    }

    // -------------------------------------------------------------------------
    // Stop paths
    // -------------------------------------------------------------------------

    /// Reset the arbiter and emit a zero command right away, ahead of the
    /// next publish tick.
    async fn apply_stop(&self) {
        self.arbiter.reset();
        if let Err(e) = self.sink.deliver(&VelocityCommand::zero()).await {
            warn!(error = %e, "zero-command delivery failed");
        }
    }

    /// Externally-triggered stop.  Always succeeds.
    pub async fn stop(&self) -> StopResponse {
        self.apply_stop().await;
        StopResponse {
            success: true,
            message: "command reset to zero velocities".to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Background tasks
    // -------------------------------------------------------------------------

    /// Spawn the fixed-rate publish loop.
    ///
    /// Each tick snapshots the arbiter and delivers the held command while it
    /// is fresh, or the zero command once it has gone stale.  The loop has no
    /// failure modes of its own; sink errors are logged and dropped.  Runs
    /// until the returned handle is aborted.
    pub fn spawn_publish_loop(&self) -> JoinHandle<()> {
        let arbiter = Arc::clone(&self.arbiter);
        let sink = Arc::clone(&self.sink);
        let period = self.publish_period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let (command, fresh) = arbiter.read(Instant::now());
                let outgoing = if fresh { command } else { VelocityCommand::zero() };
                if let Err(e) = sink.deliver(&outgoing).await {
                    warn!(error = %e, "command sink delivery failed");
                }
            }
        })
    }

    /// Spawn the inbound-directive listener.
    ///
    /// Every [`EventPayload::Instruction`] event becomes its own
    /// [`handle_instruction`][Self::handle_instruction] task, so a directive
    /// stuck on a slow remote call never delays newer ones.  Ends when the
    /// bus closes.
    pub fn spawn_instruction_listener(&self) -> JoinHandle<()> {
        // Subscribe before spawning so directives published right after this
        // call cannot slip past the listener.
        let mut rx = self.bus.subscribe_to(Topic::Instructions);
        let bridge = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let EventPayload::Instruction(directive) = event.payload {
                            let worker = bridge.clone();
                            tokio::spawn(async move {
                                worker.handle_instruction(&directive).await;
                            });
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "instruction listener lagged; directives dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use navmind_types::Vector3;
    use serde_json::json;
    use tokio::time::timeout;

    const RECV_DEADLINE: Duration = Duration::from_secs(5);

    /// A bridge whose endpoint nothing listens on, with a fast publish
    /// cadence so tests don't wait on real-time schedules.
    fn dead_endpoint_bridge() -> MotionBridge {
        MotionBridge::new(BridgeConfig {
            endpoint: "http://127.0.0.1:9/chat/completions".to_string(),
            request_timeout: Duration::from_secs(2),
            publish_rate: 100.0,
            hold_duration: Duration::from_millis(1500),
            ..BridgeConfig::default()
        })
    }

    fn forward(x: f64) -> VelocityCommand {
        VelocityCommand {
            linear: Vector3::new(x, 0.0, 0.0),
            angular: Vector3::default(),
        }
    }

    async fn next_velocity(rx: &mut navmind_middleware::TopicReceiver) -> VelocityCommand {
        loop {
            let event = timeout(RECV_DEADLINE, rx.recv())
                .await
                .expect("timed out waiting for a velocity event")
                .expect("bus closed");
            if let EventPayload::Velocity(cmd) = event.payload {
                return cmd;
            }
        }
    }

    #[test]
    fn zero_publish_rate_falls_back_to_default() {
        let bridge = MotionBridge::new(BridgeConfig {
            publish_rate: 0.0,
            ..BridgeConfig::default()
        });
        assert_eq!(
            bridge.publish_period,
            Duration::from_secs_f64(1.0 / DEFAULT_PUBLISH_RATE_HZ)
        );
    }

    #[tokio::test]
    async fn empty_directive_is_ignored() {
        let bridge = dead_endpoint_bridge();
        let now = Instant::now();
        bridge.arbiter.set(forward(0.3), now);

        bridge.handle_instruction("   ").await;

        // Neither a reset nor a remote call happened.
        let (cmd, fresh) = bridge.arbiter.read(now);
        assert_eq!(cmd.linear.x, 0.3);
        assert!(fresh);
    }

    #[tokio::test]
    async fn failed_planner_call_resets_and_emits_zero() {
        let bridge = dead_endpoint_bridge();
        bridge.arbiter.set(forward(0.5), Instant::now());
        let mut rx = bridge.bus().subscribe_to(Topic::VelocityCommands);

        bridge.handle_instruction("move forward slowly").await;

        let emitted = next_velocity(&mut rx).await;
        assert!(emitted.is_zero(), "failure path must emit zero immediately");

        let (cmd, fresh) = bridge.arbiter.read(Instant::now());
        assert!(cmd.is_zero());
        assert!(!fresh);
    }

    #[tokio::test]
    async fn stop_reports_success_and_emits_zero() {
        let bridge = dead_endpoint_bridge();
        bridge.arbiter.set(forward(0.4), Instant::now());
        let mut rx = bridge.bus().subscribe_to(Topic::VelocityCommands);

        let response = bridge.stop().await;

        assert!(response.success);
        assert!(response.message.contains("zero"));
        assert!(next_velocity(&mut rx).await.is_zero());
        let (_, fresh) = bridge.arbiter.read(Instant::now());
        assert!(!fresh);
    }

    #[tokio::test]
    async fn publish_loop_emits_held_command_while_fresh() {
        let bridge = dead_endpoint_bridge();
        bridge.arbiter.set(forward(0.25), Instant::now());
        let mut rx = bridge.bus().subscribe_to(Topic::VelocityCommands);

        let handle = bridge.spawn_publish_loop();
        let emitted = next_velocity(&mut rx).await;
        handle.abort();

        assert_eq!(emitted.linear.x, 0.25);
    }

    #[tokio::test]
    async fn publish_loop_substitutes_zero_once_stale() {
        let bridge = dead_endpoint_bridge();
        // Backdate the update far past the hold window.
        bridge
            .arbiter
            .set(forward(0.25), Instant::now() - Duration::from_secs(10));
        let mut rx = bridge.bus().subscribe_to(Topic::VelocityCommands);

        let handle = bridge.spawn_publish_loop();
        let emitted = next_velocity(&mut rx).await;
        handle.abort();

        assert!(emitted.is_zero(), "stale command must publish as zero");
    }

    #[tokio::test]
    async fn instruction_listener_drives_failure_path_end_to_end() {
        let bridge = dead_endpoint_bridge();
        bridge.arbiter.set(forward(0.5), Instant::now());
        let mut rx = bridge.bus().subscribe_to(Topic::VelocityCommands);
        let listener = bridge.spawn_instruction_listener();

        bridge
            .bus()
            .publish_to(
                Topic::Instructions,
                Event::now("test", EventPayload::Instruction("go".to_string())),
            )
            .unwrap();

        // The dead endpoint fails the plan step, which must surface as an
        // immediate zero emission and a reset slot.
        assert!(next_velocity(&mut rx).await.is_zero());
        let (_, fresh) = bridge.arbiter.read(Instant::now());
        assert!(!fresh);
        listener.abort();
    }

    /// "move forward slowly" scenario: the planner overshoots the linear cap
    /// and the pipeline clips it to the limit.
    #[test]
    fn overshooting_reply_is_clipped_to_limit() {
        let raw = json!({
            "choices": [{"message": {"content":
                r#"{"linear":{"x":0.9,"y":0},"angular":{"z":0}}"#}}]
        });
        let payload = extract_payload(&raw).unwrap();
        let (cmd, _) = clamp_velocity(&payload, &SpeedLimits::default());
        assert_eq!(cmd.linear.x, 0.6);
        assert_eq!(cmd.angular.z, 0.0);
    }
}
