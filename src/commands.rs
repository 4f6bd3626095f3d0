//! Console line parsing.
//!
//! Lines starting with `/` are commands; everything else is a message for
//! the active section.

use std::path::PathBuf;

use thiserror::Error;

#[cfg(feature = "section-data")]
use crate::dataset::Fill;
use crate::session::{Action, Section, Tone};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Switch(Section),
    Upload(PathBuf),
    History,
    Reset { all: bool },
    Save(PathBuf),
    Help,
    Quit,
    Tone(Tone),
    Action(Action),
    Audience(String),
    Info,
    Dedupe,
    #[cfg(feature = "section-data")]
    Fill { column: String, fill: Fill },
    Outliers(String),
    Corr,
    Export(Option<PathBuf>),
    Profile(Option<PathBuf>),
    Message(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '/{0}' (try /help)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

pub const HELP: &str = "\
Sections:  /chat  /docs  /data  /studio
Session:   /upload <file>   load a .pdf/.docx (docs) or .csv/.xlsx/.txt (data)
           /history         show the active section's transcript
           /reset [all]     clear the active section (or every section)
           /save <file.md>  write the active transcript as Markdown
           /help  /quit
Studio:    /tone <tone>  /action <generate|refine|summarize>  /audience <text>
Data:      /info  /dedupe  /fill <column> static <value>|mean|median
           /outliers <column>  /corr  /export [file.csv]  /profile [file.html]
Anything else is sent to the active section.";

/// Parse one console line. Blank lines are `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Message(line.to_string())));
    };

    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let args = args.trim();
    let name = name.to_ascii_lowercase();

    let cmd = match name.as_str() {
        "chat" | "docs" | "data" | "studio" => {
            Command::Switch(name.parse().map_err(CommandError::Invalid)?)
        }
        "upload" => Command::Upload(required_path(args, "/upload <file>")?),
        "history" => Command::History,
        "reset" => match args {
            "" => Command::Reset { all: false },
            "all" => Command::Reset { all: true },
            _ => return Err(CommandError::Usage("/reset [all]")),
        },
        "save" => Command::Save(required_path(args, "/save <file.md>")?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "tone" => Command::Tone(args.parse().map_err(CommandError::Invalid)?),
        "action" => Command::Action(args.parse().map_err(CommandError::Invalid)?),
        "audience" if !args.is_empty() => Command::Audience(args.to_string()),
        "audience" => return Err(CommandError::Usage("/audience <text>")),
        "info" => Command::Info,
        "dedupe" => Command::Dedupe,
        "fill" => parse_fill(args)?,
        "outliers" if !args.is_empty() => Command::Outliers(args.to_string()),
        "outliers" => return Err(CommandError::Usage("/outliers <column>")),
        "corr" => Command::Corr,
        "export" => Command::Export(optional_path(args)),
        "profile" => Command::Profile(optional_path(args)),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

fn required_path(args: &str, usage: &'static str) -> Result<PathBuf, CommandError> {
    optional_path(args).ok_or(CommandError::Usage(usage))
}

fn optional_path(args: &str) -> Option<PathBuf> {
    let p = args.trim_matches(|c| c == '"' || c == '\'');
    (!p.is_empty()).then(|| PathBuf::from(p))
}

const FILL_USAGE: &str = "/fill <column> static <value>|mean|median";

/// Column names may contain spaces, so the method is found from the right.
#[cfg(feature = "section-data")]
fn parse_fill(args: &str) -> Result<Command, CommandError> {
    let split = args
        .rfind(" static ")
        .map(|i| (&args[..i], &args[i + 1..]))
        .or_else(|| args.rsplit_once(char::is_whitespace));
    let (column, method) = split.ok_or(CommandError::Usage(FILL_USAGE))?;
    let fill = Fill::parse(method).ok_or(CommandError::Usage(FILL_USAGE))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(CommandError::Usage(FILL_USAGE));
    }
    Ok(Command::Fill { column: column.to_string(), fill })
}

#[cfg(not(feature = "section-data"))]
fn parse_fill(_args: &str) -> Result<Command, CommandError> {
    Err(CommandError::Invalid(format!("{FILL_USAGE} needs the data section")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(cmd("  hello there "), Command::Message("hello there".into()));
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn section_switches() {
        assert_eq!(cmd("/docs"), Command::Switch(Section::Docs));
        assert_eq!(cmd("/STUDIO"), Command::Switch(Section::Studio));
    }

    #[test]
    fn session_commands() {
        assert_eq!(cmd("/upload 'my file.pdf'"), Command::Upload("my file.pdf".into()));
        assert_eq!(parse("/upload"), Err(CommandError::Usage("/upload <file>")));
        assert_eq!(cmd("/reset"), Command::Reset { all: false });
        assert_eq!(cmd("/reset all"), Command::Reset { all: true });
        assert!(parse("/reset everything").is_err());
        assert_eq!(cmd("/save out/chat.md"), Command::Save("out/chat.md".into()));
        assert_eq!(cmd("/quit"), Command::Quit);
        assert_eq!(parse("/plot"), Err(CommandError::Unknown("plot".into())));
    }

    #[test]
    fn studio_settings() {
        assert_eq!(cmd("/tone humorous"), Command::Tone(Tone::Humorous));
        assert_eq!(cmd("/action summarize"), Command::Action(Action::SummarizeText));
        assert_eq!(cmd("/audience Executives and board"), Command::Audience("Executives and board".into()));
        assert!(matches!(parse("/tone angry"), Err(CommandError::Invalid(_))));
    }

    #[test]
    fn data_commands() {
        assert_eq!(cmd("/outliers Unit Price"), Command::Outliers("Unit Price".into()));
        assert_eq!(cmd("/export"), Command::Export(None));
        assert_eq!(cmd("/profile r.html"), Command::Profile(Some("r.html".into())));
        assert_eq!(cmd("/corr"), Command::Corr);
    }

    #[cfg(feature = "section-data")]
    #[test]
    fn fill_parses_column_with_spaces() {
        assert_eq!(
            cmd("/fill Customer Name static Unknown Person"),
            Command::Fill { column: "Customer Name".into(), fill: Fill::Static("Unknown Person".into()) }
        );
        assert_eq!(cmd("/fill Unit Price median"), Command::Fill { column: "Unit Price".into(), fill: Fill::Median });
        assert_eq!(parse("/fill Sales"), Err(CommandError::Usage(FILL_USAGE)));
        assert_eq!(parse("/fill mean"), Err(CommandError::Usage(FILL_USAGE)));
    }
}
