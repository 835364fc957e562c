// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::temperature::RangeAdjustment;

/// Requests from the user to the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// Persist the range, reconnect to the camera and start the statistics over.
    Reboot,

    /// Write snapshots of the thermal image and of the whole screen.
    Save,

    Adjust(RangeAdjustment),

    ToggleInterpolation,

    ToggleSmoothing,

    /// Move the temperature probe to a point on the thermal image.
    Probe { x: u32, y: u32 },

    /// Stop the frame loop.
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CommandParseError {
    Empty,
    Unknown(String),
    BadArguments(String),
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandParseError::Empty => f.write_str("No command given"),
            CommandParseError::Unknown(word) => write!(f, "Unknown command '{}'", word),
            CommandParseError::BadArguments(word) => {
                write!(f, "Invalid arguments for command '{}'", word)
            }
        }
    }
}

impl StdError for CommandParseError {}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let word = words.next().ok_or(CommandParseError::Empty)?;
        let command = match word.to_ascii_lowercase().as_str() {
            "save" => Command::Save,
            "reboot" => Command::Reboot,
            "min-" => Command::Adjust(RangeAdjustment::MinDown),
            "min+" => Command::Adjust(RangeAdjustment::MinUp),
            "max-" => Command::Adjust(RangeAdjustment::MaxDown),
            "max+" => Command::Adjust(RangeAdjustment::MaxUp),
            "interpolation" => Command::ToggleInterpolation,
            "smoothing" => Command::ToggleSmoothing,
            "quit" => Command::Shutdown,
            "probe" => {
                let bad_arguments = || CommandParseError::BadArguments(word.to_string());
                let mut coordinate = || -> Result<u32, CommandParseError> {
                    words
                        .next()
                        .and_then(|n| n.parse().ok())
                        .ok_or_else(|| bad_arguments())
                };
                let x = coordinate()?;
                let y = coordinate()?;
                return match words.next() {
                    None => Ok(Command::Probe { x, y }),
                    Some(_) => Err(bad_arguments()),
                };
            }
            _ => return Err(CommandParseError::Unknown(word.to_string())),
        };
        match words.next() {
            None => Ok(command),
            Some(_) => Err(CommandParseError::BadArguments(word.to_string())),
        }
    }
}

/// Read commands from standard input, one per line, and forward them to the frame loop.
///
/// When input closes, the task idles instead of finishing so that it doesn't stop the rest of
/// the pipeline.
pub(crate) async fn read_commands(commands: mpsc::Sender<Command>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Error reading commands from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                debug!(?command, "Forwarding command");
                if commands.send(command).is_err() {
                    info!("Frame loop has stopped, no longer reading commands");
                    return Ok(());
                }
            }
            Err(err) => warn!(%line, "{}", err),
        }
    }
    info!("Command input closed");
    futures::future::pending::<()>().await;
    Ok(())
}
