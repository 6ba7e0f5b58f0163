//! `navmind-cli` – the navmind bridge entry point.
//!
//! This binary wires the whole stack together:
//!
//! 1. Initialises structured logging (plus optional OTLP export).
//! 2. Loads `~/.navmind/config.toml` (writing a starter file on first run)
//!    and refuses to start when no completion endpoint is configured.
//! 3. Builds the [`MotionBridge`] and spawns the publish loop, the
//!    instruction listener, and the rosbridge frame adapter.
//! 4. Intercepts **Ctrl-C** to apply the fail-safe stop before exiting.
//! 5. Drops the user into an interactive directive prompt; on any exit path
//!    a final stop (zero command emission) is guaranteed.

mod config;
mod repl;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use tracing::{error, info, warn};

use navmind_middleware::{RosbridgeAdapter, Topic};
use navmind_runtime::{BridgeConfig, MotionBridge, init_tracing};
use navmind_types::{Event, EventPayload, SpeedLimits};

fn main() {
    // Hold the guard for the whole process so pending spans flush on exit.
    let _telemetry = init_tracing("navmind");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(c)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            c
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  No config found; wrote a starter file to {}",
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Config error".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // A missing endpoint is the one fatal configuration error.
    let endpoint = match cfg.resolve_endpoint() {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "refusing to start without a completion endpoint");
            eprintln!("{}: {}", "Fatal".red().bold(), e);
            std::process::exit(1);
        }
    };

    let api_key = cfg.resolve_api_key();
    if api_key.is_empty() {
        warn!("no API key provided; requests may fail if the endpoint requires authentication");
    }

    let bridge_config = BridgeConfig {
        endpoint,
        model: cfg.model.clone(),
        temperature: cfg.temperature,
        system_prompt: cfg.system_prompt.clone(),
        response_format: cfg.response_format.clone(),
        api_key,
        api_key_header: cfg.api_key_header.clone(),
        request_timeout: Duration::from_secs_f64(cfg.api_timeout_secs.max(0.0)),
        publish_rate: cfg.publish_rate,
        hold_duration: Duration::from_secs_f64(cfg.command_hold_secs.max(0.0)),
        limits: SpeedLimits {
            max_linear: cfg.max_linear_speed,
            max_lateral: cfg.max_side_speed,
            max_angular: cfg.max_angular_speed,
            allow_lateral: cfg.allow_y_motion,
        },
    };

    // ── Runtime & background tasks ────────────────────────────────────────
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: failed to start the async runtime: {}", "Fatal".red().bold(), e);
            std::process::exit(1);
        }
    };

    let bridge = MotionBridge::new(bridge_config);
    let bus = bridge.bus();

    let (publish_task, listener_task, rosbridge_task) = {
        let _enter = runtime.enter();
        (
            bridge.spawn_publish_loop(),
            bridge.spawn_instruction_listener(),
            tokio::spawn(RosbridgeAdapter::new(bus.clone(), cfg.command_topic.clone()).run()),
        )
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        let bus = bus.clone();
        let bridge = bridge.clone();
        let handle = runtime.handle().clone();
        if let Err(e) = ctrlc::set_handler(move || {
            println!();
            println!("{}", "Ctrl-C received – applying fail-safe stop …".yellow().bold());
            let _ = bus.publish_to(
                Topic::SystemAlerts,
                Event::now(
                    "navmind-cli",
                    EventPayload::Fault {
                        component: "cli".to_string(),
                        message: "operator Ctrl-C".to_string(),
                    },
                ),
            );
            let response = handle.block_on(bridge.stop());
            println!("  {} {}", "✓".green(), response.message);
            shutdown.store(true, Ordering::SeqCst);
        }) {
            warn!(error = %e, "failed to install Ctrl-C handler; graceful stop on Ctrl-C will not be available");
        }
    }

    info!(
        instruction_topic = %cfg.instruction_topic,
        command_topic = %cfg.command_topic,
        publish_rate = cfg.publish_rate,
        "navmind ready; accepting directives"
    );
    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(shutdown, bus, bridge.clone(), runtime.handle().clone());

    // ── Guaranteed final stop ─────────────────────────────────────────────
    // Runs on every exit path (/quit, EOF, read error, Ctrl-C) so the last
    // thing on the wire is a zero command.
    let response = runtime.block_on(bridge.stop());
    info!(message = %response.message, "final stop applied");

    publish_task.abort();
    listener_task.abort();
    rosbridge_task.abort();
    runtime.shutdown_timeout(Duration::from_secs(1));

    println!("{}", "Goodbye.".green());
}

fn print_banner() {
    println!();
    println!("{}", "  navmind – language-to-motion bridge".bold().cyan());
    println!("{}", "  directives in, bounded velocity out".dimmed());
    println!();
}
