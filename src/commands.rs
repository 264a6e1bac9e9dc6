//! Console input lines turned into game and score commands.

use std::str::FromStr;

use crate::{error::ServiceError, state::sequence::ButtonId};

/// One line typed at the console while no question is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start (or restart) a game.
    Start,
    /// Stop the current game.
    Stop,
    /// Push a button down and release it.
    Press(ButtonId),
    /// Push a button down.
    Down(ButtonId),
    /// Release a button.
    Up(ButtonId),
    /// Show the score list.
    Scores,
    /// Delete the score at a zero-based position.
    Delete(usize),
    /// Clear every score.
    Reset,
    /// Leave the program.
    Quit,
    /// Show the command list.
    Help,
}

/// Command summary printed by `help`.
pub const HELP: &str = "\
commands:
  start           start a new game
  stop            stop the current game
  0-3             press and release a button
  down N / up N   push or release button N
  scores          show the score list
  delete N        delete score number N
  reset           clear every score
  quit            leave";

impl FromStr for Command {
    type Err = ServiceError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| ServiceError::InvalidInput("empty command".into()))?
            .to_ascii_lowercase();
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(ServiceError::InvalidInput(format!(
                "unexpected argument `{extra}`"
            )));
        }

        let command = match (verb.as_str(), argument) {
            ("start", None) => Command::Start,
            ("stop", None) => Command::Stop,
            ("scores", None) => Command::Scores,
            ("reset", None) => Command::Reset,
            ("quit" | "exit", None) => Command::Quit,
            ("help" | "?", None) => Command::Help,
            ("down", Some(raw)) => Command::Down(parse_button(raw)?),
            ("up", Some(raw)) => Command::Up(parse_button(raw)?),
            ("delete", Some(raw)) => Command::Delete(parse_position(raw)?),
            (raw, None) if raw.chars().all(|c| c.is_ascii_digit()) => {
                Command::Press(parse_button(raw)?)
            }
            ("down" | "up" | "delete", None) => {
                return Err(ServiceError::InvalidInput(format!(
                    "`{verb}` needs an argument"
                )));
            }
            _ => {
                return Err(ServiceError::InvalidInput(format!(
                    "unknown command `{}`",
                    line.trim()
                )));
            }
        };
        Ok(command)
    }
}

fn parse_button(raw: &str) -> Result<ButtonId, ServiceError> {
    let value = raw
        .parse::<u8>()
        .map_err(|_| ServiceError::InvalidInput(format!("`{raw}` is not a button number")))?;
    Ok(ButtonId::new(value)?)
}

/// Positions are shown to the player starting at 1.
fn parse_position(raw: &str) -> Result<usize, ServiceError> {
    match raw.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position - 1),
        _ => Err(ServiceError::InvalidInput(format!(
            "`{raw}` is not a score position"
        ))),
    }
}
