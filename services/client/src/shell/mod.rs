//! services/client/src/shell/mod.rs
//!
//! A line-oriented front end over the session controller. Every command is
//! followed by a gate evaluation, so the printed location always reflects the
//! current session.

pub mod command;

use std::sync::Arc;

use session_core::{
    Credentials, Navigator, PasswordChangeForm, RegistrationForm, SessionControl, SessionError,
    SessionState,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::ClientError;
pub use command::{help, profile_patch, Command, CommandError, RoleArg};

/// Text produced by one command.
#[derive(Debug, Default)]
pub struct Outcome {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Outcome {
    fn say(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

pub struct Shell {
    session: Arc<dyn SessionControl>,
    navigator: Arc<Navigator>,
}

impl Shell {
    pub fn new(session: Arc<dyn SessionControl>, navigator: Arc<Navigator>) -> Self {
        Self { session, navigator }
    }

    pub fn location(&self) -> String {
        self.navigator.current()
    }

    /// Parses and runs one line of input.
    pub async fn handle_line(&self, line: &str) -> Outcome {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => Outcome::default(),
            Err(err) => Outcome {
                lines: vec![err.to_string()],
                quit: false,
            },
        }
    }

    pub async fn execute(&self, command: Command) -> Outcome {
        let mut out = Outcome::default();

        match command {
            Command::Visit { path } => {
                let state = self.session.state();
                self.navigator.visit(&state, &path);
            }
            Command::Login { email, password } => {
                match self.session.login(Credentials::new(email, password)).await {
                    Ok(user) => out.say(format!("signed in as {}", user.email)),
                    Err(err) => out.say(describe(&err)),
                }
            }
            Command::Logout => {
                self.session.logout().await;
                out.say("signed out");
            }
            Command::WhoAmI => out.lines.extend(summary(&self.session.state())),
            Command::Refresh => match self.session.refresh_profile().await {
                Ok(user) => out.say(format!("profile reloaded for {}", user.display_name())),
                Err(err) => out.say(describe(&err)),
            },
            Command::Profile { first, last } => {
                match self.session.update_profile(profile_patch(first, last)).await {
                    Ok(user) => out.say(format!("profile updated: {}", user.display_name())),
                    Err(err) => out.say(describe(&err)),
                }
            }
            Command::Password {
                current,
                new,
                confirm,
            } => {
                let form = PasswordChangeForm {
                    current_password: current,
                    new_password: new,
                    confirm_password: confirm,
                };
                match self.session.change_password(form).await {
                    Ok(_) => out.say("password changed"),
                    Err(err) => out.say(describe(&err)),
                }
            }
            Command::Register {
                email,
                password,
                confirm,
                first,
                last,
                role,
            } => {
                let form = RegistrationForm {
                    email,
                    password,
                    confirm_password: confirm,
                    first_name: first,
                    last_name: last,
                    role: role.map(Into::into),
                };
                match self.session.register(form).await {
                    Ok(ack) if ack.message.is_empty() => {
                        out.say("account created, you can sign in now")
                    }
                    Ok(ack) => out.say(ack.message),
                    Err(err) => out.say(describe(&err)),
                }
            }
            Command::ClearError => self.session.clear_error(),
            Command::Help => out.say(help()),
            Command::Quit => {
                out.quit = true;
                return out;
            }
        }

        let location = self.navigator.settle(&self.session.state());
        out.say(format!("@ {location}"));
        out
    }

    /// Reads commands until end of input or `quit`.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let location = self.navigator.settle(&self.session.state());
        output
            .write_all(format!("@ {location}\n> ").as_bytes())
            .await?;
        output.flush().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            debug!(command = line.split_whitespace().next().unwrap_or(""), "Shell input");
            let outcome = self.handle_line(&line).await;
            for text in &outcome.lines {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            if outcome.quit {
                break;
            }
            output.write_all(b"> ").await?;
            output.flush().await?;
        }
        output.flush().await?;
        Ok(())
    }
}

/// User-facing text for a failed operation.
fn describe(err: &SessionError) -> String {
    match err {
        SessionError::Storage(inner) => {
            warn!(error = %inner, "Session storage failure");
            "could not save the session on this device".to_string()
        }
        other => other.to_string(),
    }
}

fn summary(state: &SessionState) -> Vec<String> {
    let mut lines = Vec::new();
    match (&state.user, state.is_authenticated) {
        (Some(user), true) => {
            lines.push(format!(
                "{} <{}>{}",
                user.display_name(),
                user.email,
                if user.is_admin() { " [admin]" } else { "" }
            ));
            if let Some(token) = &state.token {
                lines.push(format!("session valid until {}", token.expires_at.to_rfc3339()));
            }
        }
        _ if !state.is_hydrated => lines.push("restoring session...".to_string()),
        _ => lines.push("not signed in".to_string()),
    }
    if let Some(err) = &state.error {
        lines.push(format!("error: {err}"));
    }
    lines
}
