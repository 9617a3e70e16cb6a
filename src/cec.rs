//! HDMI-CEC glue: a traffic listener that turns remote key presses into
//! [`RemoteEvent`]s, and one-shot TV power / input commands.
//!
//! Both paths shell out to `cec-client`; the listener parses its traffic
//! dump on a dedicated thread and feeds a bounded queue drained by the
//! render loop. When the queue is full the newest event is dropped with a
//! warning, so a stalled loop never blocks the parser.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{Sender, TrySendError};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::events::{RemoteEvent, ShutdownFlag};

/// Queue capacity for remote events; generous for human-speed input.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Parses `cec-client` traffic lines into remote events.
///
/// A key press arrives as a `User Control Pressed` frame,
/// `>> SS:44:KK` — source/destination byte, opcode 0x44, key code.
pub struct TrafficParser {
    pressed: Regex,
}

impl TrafficParser {
    /// # Errors
    /// Fails only if the frame pattern does not compile.
    pub fn new() -> Result<Self> {
        let pressed = Regex::new(r">>\s+([0-9A-Fa-f]{2}):44:([0-9A-Fa-f]{2})")
            .context("compiling CEC traffic pattern")?;
        Ok(Self { pressed })
    }

    /// Map one traffic line to an event. Unrecognized key codes and
    /// non-traffic lines yield `None`; the event set stays closed.
    #[must_use]
    pub fn parse(&self, line: &str) -> Option<RemoteEvent> {
        let captures = self.pressed.captures(line)?;
        match captures.get(2)?.as_str().to_ascii_uppercase().as_str() {
            "00" => Some(RemoteEvent::Select),
            "03" => Some(RemoteEvent::Left),
            "04" => Some(RemoteEvent::Right),
            _ => None,
        }
    }
}

/// Spawn `cec-client` in traffic mode and forward recognized key presses
/// into `events` until the process exits or shutdown is requested.
///
/// A missing binary or spawn failure is a warning, not an error: the
/// slideshow stays usable from the keyboard.
pub fn spawn_listener(events: Sender<RemoteEvent>, shutdown: ShutdownFlag) {
    let parser = match TrafficParser::new() {
        Ok(parser) => parser,
        Err(err) => {
            warn!(error = %err, "CEC parser unavailable; remote disabled");
            return;
        }
    };

    thread::Builder::new()
        .name("cec-listener".into())
        .spawn(move || listen(&parser, &events, &shutdown))
        .map(|_| ())
        .unwrap_or_else(|err| warn!(error = %err, "failed to start CEC listener thread"));
}

fn listen(parser: &TrafficParser, events: &Sender<RemoteEvent>, shutdown: &ShutdownFlag) {
    let child = Command::new("cec-client")
        .args(["-t", "p", "-d", "8"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match child {
        Ok(child) => child,
        Err(err) => {
            warn!(error = %err, "cannot start cec-client; remote disabled");
            return;
        }
    };
    let Some(stdout) = child.stdout.take() else {
        warn!("cec-client spawned without stdout; remote disabled");
        return;
    };
    info!("CEC traffic listener started");

    for line in BufReader::new(stdout).lines() {
        if shutdown.is_set() {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "CEC stream read failed");
                break;
            }
        };
        let Some(event) = parser.parse(&line) else {
            continue;
        };
        debug!(?event, "remote key press");
        match events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(?dropped, "remote event queue full; dropping newest");
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    let _ = child.kill();
    let _ = child.wait();
    info!("CEC traffic listener exiting");
}

/// One-shot TV control over CEC, mirroring `cec-client -s` usage.
pub struct TvControl;

impl TvControl {
    /// Ask the TV (logical address 0) to power on.
    ///
    /// # Errors
    /// Fails when `cec-client` cannot be run or exits unsuccessfully.
    pub fn power_on() -> Result<()> {
        run_one_shot("on 0")
    }

    /// Put the TV into standby.
    ///
    /// # Errors
    /// Fails when `cec-client` cannot be run or exits unsuccessfully.
    pub fn standby() -> Result<()> {
        run_one_shot("standby 0")
    }

    /// Broadcast an Active Source frame for the given HDMI input.
    ///
    /// # Errors
    /// Fails when `cec-client` cannot be run or exits unsuccessfully.
    pub fn select_input(input: u8) -> Result<()> {
        // Physical address N.0.0.0 encodes as N0:00.
        let input = input.clamp(1, 4);
        run_one_shot(&format!("tx 1F:82:{input}0:00"))
    }
}

fn run_one_shot(command: &str) -> Result<()> {
    let mut child = Command::new("cec-client")
        .args(["-s", "-d", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("starting cec-client")?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(command.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .context("writing CEC command")?;
    }
    let status = child.wait().context("waiting for cec-client")?;
    anyhow::ensure!(status.success(), "cec-client exited with {status}");
    Ok(())
}
