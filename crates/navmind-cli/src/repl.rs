//! REPL – interactive directive prompt for the navmind bridge.
//!
//! Anything that is not a slash-command is dispatched as a directive.
//! Supported slash-commands:
//!   /help         – show this list
//!   /status       – show the held command and its freshness
//!   /stop         – reset to zero velocities immediately
//!   /quit | /exit – exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use navmind_middleware::{EventBus, Topic};
use navmind_runtime::MotionBridge;
use navmind_types::{Event, EventPayload};
use tokio::runtime::Handle;

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set (Ctrl-C or `/quit`) the
/// REPL exits cleanly and `main` applies the final stop.
pub fn run(shutdown: Arc<AtomicBool>, bus: EventBus, bridge: MotionBridge, handle: Handle) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "navmind>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/help" => cmd_help(),
            "/status" => cmd_status(&bridge),
            "/stop" => {
                let response = handle.block_on(bridge.stop());
                println!("  {} {}", "✓".green(), response.message);
            }
            "/quit" | "/exit" => {
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            other if other.starts_with('/') => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
            directive => {
                let event = Event::now(
                    "navmind-cli::repl",
                    EventPayload::Instruction(directive.to_string()),
                );
                match bus.publish_to(Topic::Instructions, event) {
                    Ok(_) => println!("  {} directive dispatched", "→".dimmed()),
                    Err(e) => println!("{}: {}", "Dispatch failed".red(), e),
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "navmind Commands".bold().underline());
    println!("  {}        – show the held command and its freshness", "/status".bold().cyan());
    println!("  {}          – reset to zero velocities immediately",   "/stop".bold().cyan());
    println!("  {}   – exit the CLI",                                  "/quit  /exit".bold().cyan());
    println!();
    println!("  Any other input is sent to the planner as a directive,");
    println!("  e.g. {}", "move forward slowly".italic());
    println!();
}

fn cmd_status(bridge: &MotionBridge) {
    let (cmd, fresh) = bridge.arbiter().read(Instant::now());
    let state = if fresh {
        "FRESH".green().bold()
    } else {
        "STALE (publishing zero)".yellow().bold()
    };
    println!("  state   : {}", state);
    println!("  linear  : x={:.3} y={:.3}", cmd.linear.x, cmd.linear.y);
    println!("  angular : z={:.3}", cmd.angular.z);
}
