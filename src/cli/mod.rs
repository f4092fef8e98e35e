use crate::domain::{PageData, format_minutes, parse_duration_text};
use crate::infra::{
    DEFAULT_BASE_URL, GatewayError, LoadPageFileError, MutationGateway, load_page_file,
};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LIMIT: usize = 25;

pub const BASE_URL_ENV: &str = "PLAYTRAIL_BASE_URL";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui { options: CliOptions },
    Command(CliCommand),
}

/// Connection options shared by the TUI and the plain commands. The page
/// data comes from the backend, or from a local snapshot when `--data` is
/// given (mutations always need the backend).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CliOptions {
    pub base_url: Option<String>,
    pub profile: Option<i64>,
    pub data_file: Option<PathBuf>,
}

impl CliOptions {
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Sessions {
        options: CliOptions,
        offset: usize,
        limit: usize,
        min_minutes: u32,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    PageFile(#[from] LoadPageFileError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();
    let mut options = CliOptions::default();
    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--base-url" | "-b" | "--profile" | "--data" => {
                let flag = iter.next().cloned().unwrap_or_default();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue(flag.clone()))?;
                apply_option_flag(&mut options, &flag, value)?;
            }
            "--" => {
                let _ = iter.next();
                break;
            }
            _ => break,
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Tui { options });
    };

    match subcommand.as_str() {
        "sessions" => {
            let mut offset = 0usize;
            let mut limit = DEFAULT_LIMIT;
            let mut min_minutes = 0u32;

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--base-url" | "-b" | "--profile" | "--data" => {
                        let value = iter
                            .next()
                            .ok_or_else(|| CliParseError::MissingFlagValue(arg.clone()))?;
                        apply_option_flag(&mut options, arg, value)?;
                    }
                    "--limit" | "-l" => {
                        let value = iter
                            .next()
                            .ok_or_else(|| CliParseError::MissingFlagValue("--limit".to_string()))?;
                        limit = parse_usize_flag("--limit", value)?;
                    }
                    "--offset" | "-o" => {
                        let value = iter.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--offset".to_string())
                        })?;
                        offset = parse_usize_flag("--offset", value)?;
                    }
                    "--longer-than" => {
                        let value = iter.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--longer-than".to_string())
                        })?;
                        // Same lenient codec the table uses: "2h 15m",
                        // "45m", unreadable text means no lower bound.
                        min_minutes = parse_duration_text(value);
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }

            Ok(CliInvocation::Command(CliCommand::Sessions {
                options,
                offset,
                limit,
                min_minutes,
            }))
        }
        other => Err(CliParseError::UnknownSubcommand(other.to_string())),
    }
}

fn apply_option_flag(
    options: &mut CliOptions,
    flag: &str,
    value: &String,
) -> Result<(), CliParseError> {
    match flag {
        "--base-url" | "-b" => options.base_url = Some(value.clone()),
        "--profile" => {
            let id = value
                .parse::<i64>()
                .map_err(|_| CliParseError::InvalidFlagValue {
                    flag: "--profile".to_string(),
                    value: value.clone(),
                })?;
            options.profile = Some(id);
        }
        "--data" => options.data_file = Some(PathBuf::from(value)),
        _ => return Err(CliParseError::UnknownFlag(flag.to_string())),
    }
    Ok(())
}

fn parse_usize_flag(flag: &str, value: &String) -> Result<usize, CliParseError> {
    value
        .parse::<usize>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.clone(),
        })
}

pub fn run(command: CliCommand) -> Result<(), CliRunError> {
    match command {
        CliCommand::Sessions {
            options,
            offset,
            limit,
            min_minutes,
        } => run_sessions(&options, offset, limit, min_minutes),
    }
}

fn run_sessions(
    options: &CliOptions,
    offset: usize,
    limit: usize,
    min_minutes: u32,
) -> Result<(), CliRunError> {
    let page = load_page(options)?;
    let mut out = io::stdout().lock();
    for session in page
        .sessions
        .iter()
        .filter(|session| session.duration_minutes >= min_minutes)
        .skip(offset)
        .take(limit)
    {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            session.start_date,
            session.start_time,
            session.end_time,
            format_minutes(session.duration_minutes),
            session.session_type.label(),
            session.game_name,
        )?;
    }
    Ok(())
}

fn load_page(options: &CliOptions) -> Result<PageData, CliRunError> {
    match &options.data_file {
        Some(path) => Ok(load_page_file(path)?),
        None => {
            let gateway = MutationGateway::new(options.resolved_base_url());
            Ok(gateway.fetch_page_data(options.profile)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        std::iter::once("playtrail")
            .chain(parts.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn bare_invocation_starts_the_tui() {
        let invocation = parse_invocation(&args(&[])).expect("parse");
        assert_eq!(
            invocation,
            CliInvocation::Tui {
                options: CliOptions::default()
            }
        );
    }

    #[test]
    fn connection_flags_are_collected() {
        let invocation = parse_invocation(&args(&[
            "--base-url",
            "http://tracker:9000",
            "--profile",
            "2",
        ]))
        .expect("parse");
        let CliInvocation::Tui { options } = invocation else {
            panic!("expected Tui invocation");
        };
        assert_eq!(options.base_url.as_deref(), Some("http://tracker:9000"));
        assert_eq!(options.profile, Some(2));
    }

    #[test]
    fn sessions_subcommand_takes_paging_flags() {
        let invocation =
            parse_invocation(&args(&["sessions", "--limit", "5", "--offset", "10"])).expect("parse");
        assert_eq!(
            invocation,
            CliInvocation::Command(CliCommand::Sessions {
                options: CliOptions::default(),
                offset: 10,
                limit: 5,
                min_minutes: 0,
            })
        );
    }

    #[test]
    fn longer_than_uses_the_duration_codec() {
        let invocation =
            parse_invocation(&args(&["sessions", "--longer-than", "1h 30m"])).expect("parse");
        let CliInvocation::Command(CliCommand::Sessions { min_minutes, .. }) = invocation else {
            panic!("expected sessions command");
        };
        assert_eq!(min_minutes, 90);
    }

    #[test]
    fn data_flag_points_at_a_snapshot() {
        let invocation =
            parse_invocation(&args(&["sessions", "--data", "pages/sessions_2.json"])).expect("parse");
        let CliInvocation::Command(CliCommand::Sessions { options, .. }) = invocation else {
            panic!("expected sessions command");
        };
        assert_eq!(
            options.data_file,
            Some(PathBuf::from("pages/sessions_2.json"))
        );
    }

    #[test]
    fn bad_values_and_unknown_flags_are_rejected() {
        assert!(matches!(
            parse_invocation(&args(&["--profile", "guest"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
        assert!(matches!(
            parse_invocation(&args(&["sessions", "--nope"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["frobnicate"])),
            Err(CliParseError::UnknownSubcommand(_))
        ));
    }

    #[test]
    fn help_and_version_win_over_everything() {
        assert_eq!(
            parse_invocation(&args(&["sessions", "--help"])).expect("parse"),
            CliInvocation::PrintHelp
        );
        assert_eq!(
            parse_invocation(&args(&["-V"])).expect("parse"),
            CliInvocation::PrintVersion
        );
    }
}
