use crate::application::controller::UserIntent;
use crate::error::{CheckoutError, Result};
use std::io::BufRead;

/// Reads payer commands, one per line, from a terminal or pipe.
///
/// Blank lines are skipped. Recognised commands: `paid`, `copy`, `restart`
/// and `quit` (plus a few aliases).
pub struct CommandReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<UserIntent>> {
        self.source.lines().filter_map(|line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_command(&line)),
            Err(e) => Some(Err(CheckoutError::from(e))),
        })
    }
}

pub fn parse_command(line: &str) -> Result<UserIntent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "paid" | "confirm" => Ok(UserIntent::ConfirmPayment),
        "copy" => Ok(UserIntent::CopyCode),
        "restart" | "retry" => Ok(UserIntent::Restart),
        "quit" | "back" | "abandon" => Ok(UserIntent::Abandon),
        other => Err(CheckoutError::ValidationError(format!(
            "unknown command '{other}' (expected paid, copy, restart or quit)"
        ))),
    }
}
