//! PTY (console) front end: reads lines from stdin, dispatches them to the
//! section handlers and prints replies as their fragments arrive.
//!
//! Runs until `/quit`, stdin closes, or the `shutdown` token is cancelled
//! (Ctrl-C). A cancelled token also drops an in-flight model request.

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agents::{self, AgentsState};
use crate::commands::{self, Command, HELP};
use crate::error::{AppError, InteractionError};
use crate::session::{Section, SessionContext, Turn};

/// Printed after a reply that failed part-way; the partial text is not kept.
pub const PARTIAL_REPLY_NOTE: &str = "[reply interrupted; the partial text above was not saved]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One console session writing to `out`.
pub struct Console<W: Write> {
    state: AgentsState,
    session: SessionContext,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(state: AgentsState, out: W) -> Self {
        Self { state, session: SessionContext::new(), out }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn banner(&mut self, app_name: &str) -> std::io::Result<()> {
        writeln!(self.out, "─────────────────────────────────")?;
        writeln!(self.out, " {app_name} console  (Ctrl-C to quit, /help for commands)")?;
        writeln!(self.out, " model: {}", self.state.provider.model_name())?;
        writeln!(self.out, "─────────────────────────────────")?;
        self.print_section()
    }

    pub fn prompt(&mut self) -> std::io::Result<()> {
        write!(self.out, "[{}]> ", self.session.active)?;
        self.out.flush()
    }

    fn print_section(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "── {} ──", self.session.active.title())?;
        self.print_history()
    }

    fn print_history(&mut self) -> std::io::Result<()> {
        let section = self.session.active;
        let turns: Vec<&Turn> = match section {
            #[cfg(feature = "section-studio")]
            Section::Studio => agents::studio::history(&self.session).collect(),
            _ => self.session.transcript(section).turns().iter().collect(),
        };
        for turn in turns {
            writeln!(self.out, "{}: {}", turn.role, turn.text)?;
        }
        Ok(())
    }

    /// Handle one console line. Interaction failures are printed, not returned.
    pub async fn handle_line(&mut self, line: &str) -> std::io::Result<Flow> {
        let cmd = match commands::parse(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                writeln!(self.out, "error: {e}")?;
                return Ok(Flow::Continue);
            }
        };
        debug!(?cmd, section = %self.session.active, "console command");

        let result = match cmd {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => Ok(HELP.to_string()),
            Command::Message(text) => {
                let Self { state, session, out } = self;
                writeln!(out, "assistant:")?;
                let mut streamed = false;
                let mut sink = |f: &str| {
                    streamed = true;
                    let _ = out.write_all(f.as_bytes());
                    let _ = out.flush();
                };
                let result = agents::respond(state, session, &text, &mut sink).await;
                writeln!(out)?;
                if result.is_err() && streamed {
                    writeln!(out, "{PARTIAL_REPLY_NOTE}")?;
                }
                result.map(|_| String::new())
            }
            Command::Switch(section) => {
                self.session.active = section;
                self.print_section()?;
                Ok(String::new())
            }
            Command::History => {
                self.print_history()?;
                Ok(String::new())
            }
            Command::Upload(path) => match agents::upload(&self.state, &mut self.session, &path).await {
                Ok((section, msg)) => {
                    self.session.active = section;
                    Ok(format!("── {} ──\n{msg}", section.title()))
                }
                Err(e) => Err(e),
            },
            Command::Reset { all: true } => {
                self.session.reset();
                Ok("All sections reset.".to_string())
            }
            Command::Reset { all: false } => {
                self.session.reset_section(self.session.active);
                Ok(format!("{} reset.", self.session.active.title()))
            }
            Command::Save(path) => self.save(&path),
            Command::Tone(tone) => {
                self.session.studio_settings.tone = tone;
                Ok(format!("Tone: {tone}"))
            }
            Command::Action(action) => {
                self.session.studio_settings.action = action;
                Ok(format!("Action: {action}"))
            }
            Command::Audience(audience) => {
                let msg = format!("Audience: {audience}");
                self.session.studio_settings.audience = audience;
                Ok(msg)
            }
            data => self.data_command(data),
        };

        match result {
            Ok(text) if text.is_empty() => {}
            Ok(text) => writeln!(self.out, "{text}")?,
            Err(e) => writeln!(self.out, "error: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn save(&mut self, path: &Path) -> Result<String, InteractionError> {
        let dest = self.state.resolve(path);
        self.session.transcript(self.session.active).save_markdown(&dest)?;
        info!(path = %dest.display(), section = %self.session.active, "transcript saved");
        Ok(format!("Transcript saved to {}", dest.display()))
    }

    #[cfg(feature = "section-data")]
    fn data_command(&mut self, cmd: Command) -> Result<String, InteractionError> {
        use crate::agents::data;

        let (state, session) = (&self.state, &mut self.session);
        match cmd {
            Command::Info => data::describe(session),
            Command::Dedupe => data::dedupe(session),
            Command::Fill { column, fill } => data::fill(session, &column, &fill),
            Command::Outliers(column) => data::outliers(session, &column),
            Command::Corr => data::correlation(session),
            Command::Export(path) => data::export(state, session, path.as_deref())
                .map(|p| format!("Cleaned data exported to {}", p.display())),
            Command::Profile(path) => data::profile(state, session, path.as_deref())
                .map(|p| format!("Report generated: {}", p.display())),
            other => {
                warn!(?other, "command reached the data handler unexpectedly");
                Ok(String::new())
            }
        }
    }

    #[cfg(not(feature = "section-data"))]
    fn data_command(&mut self, _cmd: Command) -> Result<String, InteractionError> {
        Err(InteractionError::SectionDisabled("data"))
    }
}

/// Drive a [`Console`] on stdin/stdout until quit, EOF or shutdown.
pub async fn run_pty(state: AgentsState, app_name: &str, shutdown: CancellationToken) -> Result<(), AppError> {
    info!("console started");
    let mut console = Console::new(state, std::io::stdout());
    console.banner(app_name)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        console.prompt()?;

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!("\n[console] shutdown signal received");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("console stdin closed");
                        break;
                    }
                    Ok(Some(input)) => {
                        let flow = tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => {
                                println!("\n[console] interrupted");
                                break;
                            }
                            flow = console.handle_line(&input) => flow?,
                        };
                        if flow == Flow::Quit {
                            break;
                        }
                    }
                }
            }
        }
    }

    info!(session = %console.session().id, "console closed");
    Ok(())
}
