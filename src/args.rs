//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. Flags may appear anywhere on the
//! command line; the first positional argument selects a one-shot command and
//! running without one starts the daemon.

use chrono::NaiveDate;

use crate::constants::{DEFAULT_BRIGHTNESS_STEP, MAXIMUM_BRIGHTNESS};
use crate::time_source::parse_date;

/// One-shot commands that do not start the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the dimming plan for a date (today when omitted)
    Plan { date: Option<NaiveDate> },
    /// Print sunrise and sunset for a date (today when omitted)
    Sun { date: Option<NaiveDate> },
    On,
    Off,
    Toggle,
    /// Set every light to an absolute brightness
    Brightness(u8),
    /// Raise brightness by a relative amount
    Brighter(i16),
    /// Lower brightness by a relative amount
    Dimmer(i16),
    /// Print all properties, or one property per light
    Props { name: Option<String> },
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Run a one-shot command
    Command {
        command: Command,
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// `args` includes the program name, as `std::env::args()` does. Version
    /// takes precedence over help, and help over everything else.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let mut iter = args.into_iter().skip(1).map(|s| s.as_ref().to_string());
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--config" | "-c" => match iter.next() {
                    Some(dir) if !dir.starts_with('-') => config_dir = Some(dir),
                    _ => {
                        log_warning!("Missing directory for --config");
                        unknown_arg_found = true;
                    }
                },
                _ if arg.starts_with('-') && arg.parse::<i64>().is_err() => {
                    log_warning!("Unknown argument: {}", arg);
                    unknown_arg_found = true;
                }
                _ => positionals.push(arg),
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if positionals.is_empty() {
            CliAction::Run {
                debug_enabled,
                config_dir,
            }
        } else if positionals[0] == "help" {
            CliAction::ShowHelp
        } else {
            match parse_command(&positionals) {
                Some(command) => CliAction::Command {
                    command,
                    debug_enabled,
                    config_dir,
                },
                None => CliAction::ShowHelpDueToError,
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Parse `<command> [args...]`. Logs a usage hint and returns `None` when the
/// command is unknown or its arguments are wrong.
fn parse_command(positionals: &[String]) -> Option<Command> {
    let (name, rest) = positionals.split_first()?;

    let command = match (name.as_str(), rest) {
        ("plan", []) => Some(Command::Plan { date: None }),
        ("plan", [date]) => parse_date_arg(date).map(|date| Command::Plan { date: Some(date) }),
        ("sun", []) => Some(Command::Sun { date: None }),
        ("sun", [date]) => parse_date_arg(date).map(|date| Command::Sun { date: Some(date) }),
        ("on", []) => Some(Command::On),
        ("off", []) => Some(Command::Off),
        ("toggle", []) => Some(Command::Toggle),
        ("brightness", [value]) => match value.parse::<u8>() {
            Ok(percent) if percent <= MAXIMUM_BRIGHTNESS => Some(Command::Brightness(percent)),
            _ => {
                log_warning!("Brightness must be a number from 0 to 100");
                None
            }
        },
        ("brighter", []) => Some(Command::Brighter(DEFAULT_BRIGHTNESS_STEP)),
        ("brighter", [amount]) => parse_step(amount).map(Command::Brighter),
        ("dimmer", []) => Some(Command::Dimmer(DEFAULT_BRIGHTNESS_STEP)),
        ("dimmer", [amount]) => parse_step(amount).map(Command::Dimmer),
        ("props", []) => Some(Command::Props { name: None }),
        ("props", [name]) => Some(Command::Props {
            name: Some(name.clone()),
        }),
        (
            "plan" | "sun" | "on" | "off" | "toggle" | "brightness" | "brighter" | "dimmer"
            | "props",
            _,
        ) => {
            log_warning!("Wrong number of arguments for '{}'", name);
            None
        }
        _ => {
            log_warning!("Unknown command: {}", name);
            None
        }
    };

    if command.is_none() {
        crate::commands::help::show_command_usage(name);
    }
    command
}

fn parse_date_arg(value: &str) -> Option<NaiveDate> {
    match parse_date(value) {
        Ok(date) => Some(date),
        Err(e) => {
            log_warning!("{}", e);
            None
        }
    }
}

fn parse_step(value: &str) -> Option<i16> {
    match value.parse::<i16>() {
        Ok(step) if (1..=i16::from(MAXIMUM_BRIGHTNESS)).contains(&step) => Some(step),
        _ => {
            log_warning!("Step must be a number from 1 to 100");
            None
        }
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!("{}", env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("sundim [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands (none = run the daemon):");
    log_indented!("plan [YYYY-MM-DD]      Show the dimming plan for a date");
    log_indented!("sun [YYYY-MM-DD]       Show sunrise and sunset for a date");
    log_indented!("on | off | toggle      Switch all lights");
    log_indented!("brightness <0-100>     Set brightness on all lights");
    log_indented!("brighter [N]           Raise brightness by N (default 10)");
    log_indented!("dimmer [N]             Lower brightness by N (default 10)");
    log_indented!("props [NAME]           Show bulb properties");
    log_indented!("help                   Show this help");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Option<Command> {
        let mut full = vec!["sundim"];
        full.extend_from_slice(args);
        match ParsedArgs::parse(full).action {
            CliAction::Command { command, .. } => Some(command),
            _ => None,
        }
    }

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["sundim"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_parse_debug_and_config() {
        let parsed = ParsedArgs::parse(vec!["sundim", "-d", "--config", "/tmp/sundim"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/sundim".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_config_without_dir() {
        let parsed = ParsedArgs::parse(vec!["sundim", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_help_flags() {
        assert_eq!(ParsedArgs::parse(vec!["sundim", "-h"]).action, CliAction::ShowHelp);
        assert_eq!(ParsedArgs::parse(vec!["sundim", "help"]).action, CliAction::ShowHelp);
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["sundim", "--version", "--help", "--debug"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
        assert_eq!(ParsedArgs::parse(vec!["sundim", "-v"]).action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["sundim", "--debug", "--invalid"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_unknown_command() {
        let parsed = ParsedArgs::parse(vec!["sundim", "dance"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_plan_and_sun_dates() {
        assert_eq!(command(&["plan"]), Some(Command::Plan { date: None }));
        assert_eq!(
            command(&["sun", "2024-06-21"]),
            Some(Command::Sun {
                date: NaiveDate::from_ymd_opt(2024, 6, 21)
            })
        );
        assert_eq!(command(&["plan", "21/06/2024"]), None);
    }

    #[test]
    fn test_brightness_commands() {
        assert_eq!(command(&["brightness", "40"]), Some(Command::Brightness(40)));
        assert_eq!(command(&["brightness", "0"]), Some(Command::Brightness(0)));
        assert_eq!(command(&["brightness", "101"]), None);
        assert_eq!(command(&["brightness"]), None);

        assert_eq!(
            command(&["brighter"]),
            Some(Command::Brighter(DEFAULT_BRIGHTNESS_STEP))
        );
        assert_eq!(command(&["dimmer", "25"]), Some(Command::Dimmer(25)));
        assert_eq!(command(&["dimmer", "0"]), None);
    }

    #[test]
    fn test_power_and_props_commands() {
        assert_eq!(command(&["on"]), Some(Command::On));
        assert_eq!(command(&["off", "-d"]), Some(Command::Off));
        assert_eq!(command(&["toggle", "now"]), None);
        assert_eq!(
            command(&["props", "bright"]),
            Some(Command::Props {
                name: Some("bright".to_string())
            })
        );
    }

    #[test]
    fn test_command_keeps_flags() {
        let parsed = ParsedArgs::parse(vec!["sundim", "on", "-c", "/etc/sundim", "--debug"]);
        assert_eq!(
            parsed.action,
            CliAction::Command {
                command: Command::On,
                debug_enabled: true,
                config_dir: Some("/etc/sundim".to_string()),
            }
        );
    }
}
