//! Helper commands
//!
//! What each command-line verb does against a [`BlueLightClient`], and how
//! its result is printed.

use std::fmt;

use tracing::debug;

use crate::client::BlueLightClient;
use crate::ffi::{BridgeError, BridgeResult, ObjcRuntime, Operation, Signature, StatusRecord};

/// A parsed helper command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    On,
    Off,
    Toggle,
    /// Read the strength, or apply it when a percentage is given.
    Temp(Option<u8>),
    Info,
    Supported,
    Check,
}

impl Command {
    /// Build a `temp` command from its raw argument.
    ///
    /// Anything that is not an integer in `0..=100` reads the current value
    /// instead, unless `strict` is set, in which case it is rejected.
    pub fn temp(arg: Option<&str>, strict: bool) -> BridgeResult<Self> {
        let Some(raw) = arg else {
            return Ok(Command::Temp(None));
        };

        match raw.parse::<i64>() {
            Ok(value) if (0..=100).contains(&value) => Ok(Command::Temp(Some(value as u8))),
            _ if strict => Err(BridgeError::InvalidArgument(format!(
                "temp expects an integer from 0 to 100, got '{}'",
                raw
            ))),
            _ => {
                debug!(argument = raw, "ignoring temp argument outside 0-100, reading instead");
                Ok(Command::Temp(None))
            }
        }
    }
}

/// One row of `check` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLine {
    pub selector: &'static str,
    pub signature: Signature,
    pub resolved: bool,
}

/// The printable result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Enabled flag, printed as `on`/`off`.
    State(bool),
    /// Strength percentage.
    Percent(u8),
    /// Full status record, one `name: value` line per field.
    Status(StatusRecord),
    /// Platform support, printed as `yes`/`no`.
    Supported(bool),
    /// Resolution report for every operation.
    Check(Vec<CheckLine>),
}

impl Outcome {
    /// Whether the helper should exit with status 0 after printing this.
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Check(lines) => lines.iter().all(|line| line.resolved),
            _ => true,
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::State(enabled) => f.write_str(on_off(*enabled)),
            Outcome::Percent(percent) => write!(f, "{}", percent),
            Outcome::Supported(yes) => f.write_str(if *yes { "yes" } else { "no" }),
            Outcome::Status(status) => {
                writeln!(f, "enabled: {}", on_off(status.enabled.is_true()))?;
                writeln!(f, "active: {}", on_off(status.active.is_true()))?;
                writeln!(f, "available: {}", status.available.is_true())?;
                writeln!(
                    f,
                    "sun_schedule_permitted: {}",
                    status.sun_schedule_permitted.is_true()
                )?;
                writeln!(f, "mode: {}", status.mode)?;
                writeln!(f, "schedule: {}", status.schedule)?;
                writeln!(f, "disable_flags: {:#x}", status.disable_flags)?;
                write!(f, "available_options: {:#x}", status.available_options)
            }
            Outcome::Check(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(
                        f,
                        "{:<28} {:<28} {}",
                        line.selector,
                        line.signature.to_string(),
                        if line.resolved { "ok" } else { "missing" }
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Run `command`. Nothing is returned for printing unless every native
/// call it needs succeeded.
pub fn execute<R: ObjcRuntime>(
    client: &mut BlueLightClient<R>,
    command: Command,
) -> BridgeResult<Outcome> {
    match command {
        Command::Status => Ok(Outcome::State(client.is_enabled()?)),
        Command::On => {
            client.set_enabled(true)?;
            Ok(Outcome::State(true))
        }
        Command::Off => {
            client.set_enabled(false)?;
            Ok(Outcome::State(false))
        }
        Command::Toggle => Ok(Outcome::State(client.toggle()?)),
        Command::Temp(None) => Ok(Outcome::Percent(client.strength()?)),
        Command::Temp(Some(percent)) => {
            Ok(Outcome::Percent(client.set_strength(percent as i64)?))
        }
        Command::Info => Ok(Outcome::Status(client.status()?)),
        Command::Supported => Ok(Outcome::Supported(client.is_supported()?)),
        Command::Check => {
            let report = client.bridge_mut().preflight();
            let lines = report
                .into_iter()
                .map(|(operation, result): (Operation, _)| CheckLine {
                    selector: operation.selector(),
                    signature: operation.signature(),
                    resolved: result.is_ok(),
                })
                .collect();
            Ok(Outcome::Check(lines))
        }
    }
}
