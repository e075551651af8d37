//! services/client/src/shell/command.rs
//!
//! The line commands accepted by the interactive shell, parsed with `clap`.
//! Each input line is treated as a full command line whose first word names
//! the subcommand.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use session_core::{ProfilePatch, Role};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(String),
}

#[derive(Parser, Debug)]
#[command(
    multicall = true,
    disable_help_subcommand = true,
    help_template = "commands:\n{subcommands}"
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Navigate to a page
    #[command(alias = "go")]
    Visit { path: String },
    /// Sign in
    Login { email: String, password: String },
    /// Sign out
    Logout,
    /// Show the current session
    #[command(name = "whoami")]
    WhoAmI,
    /// Reload the profile from the server
    Refresh,
    /// Update your name ('-' keeps a field)
    Profile { first: String, last: String },
    /// Change your password
    Password {
        current: String,
        new: String,
        confirm: String,
    },
    /// Create an account
    Register {
        email: String,
        password: String,
        confirm: String,
        first: String,
        last: String,
        #[arg(value_enum)]
        role: Option<RoleArg>,
    },
    /// Dismiss the current error
    #[command(name = "clear")]
    ClearError,
    /// Show this text
    #[command(alias = "?")]
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
        }
    }
}

/// The list of commands, rendered from their definitions.
pub fn help() -> String {
    Line::command().render_help().to_string().trim_end().to_string()
}

/// The usage line of one subcommand, without clap's `Usage:` prefix.
fn usage_of(name: &str) -> Option<String> {
    let mut root = Line::command();
    let sub = root.find_subcommand_mut(name)?;
    let usage = sub.render_usage().to_string();
    Some(usage.trim().trim_start_matches("Usage:").trim().to_string())
}

fn keep(value: String) -> Option<String> {
    (value != "-").then_some(value)
}

/// Builds a profile patch from the two name arguments; `-` leaves a field alone.
pub fn profile_patch(first: String, last: String) -> ProfilePatch {
    ProfilePatch {
        first_name: keep(first),
        last_name: keep(last),
    }
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let Some(name) = line.split_whitespace().next() else {
            return Ok(None);
        };

        match Line::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => Ok(Some(parsed.command)),
            Err(_) => match usage_of(name) {
                Some(usage) => Err(CommandError::Usage(usage)),
                None => Err(CommandError::Unknown(name.to_string())),
            },
        }
    }
}
