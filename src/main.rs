//! Main application entry point.
//!
//! Parses the command line and dispatches: help and version exit early,
//! one-shot commands run through [`sundim::commands`], and no command starts
//! the daemon through [`sundim::Sundim`].

use anyhow::Result;

use sundim::args::{self, CliAction, ParsedArgs};
use sundim::constants::EXIT_FAILURE;
use sundim::{
    Sundim, commands, config, log_critical, log_debug, log_end, log_error_exit, log_pipe,
};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            if let Err(e) = Sundim::new(debug_enabled).run() {
                log_pipe!();
                log_critical!("{e:#}");
                log_end!();
                std::process::exit(EXIT_FAILURE);
            }
            Ok(())
        }
        CliAction::Command {
            command,
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            if debug_enabled {
                log_pipe!();
                log_debug!("Running command: {:?}", command);
            }
            if let Err(e) = commands::run_command(command) {
                log_error_exit!("{e:#}");
                std::process::exit(EXIT_FAILURE);
            }
            Ok(())
        }
    }
}
