//! This module handles the initial setup of the application.
use super::args::{AppArgs, RunArgs};
use anyhow::Result;
use console_relay::ConsoleOptions;
use tracing_subscriber::EnvFilter;

/// Configures diagnostics logging.
///
/// Diagnostics go to stderr so they never mix with mirrored stdout.
/// `RUST_LOG` overrides the default filter.
pub fn configure_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,console_relay=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Loads console options from the config file, if any.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub fn load_options(args: &AppArgs) -> Result<ConsoleOptions> {
    match &args.config {
        Some(path) => ConsoleOptions::from_json_file(path),
        None => Ok(ConsoleOptions::default()),
    }
}

/// Applies `run` flags on top of file options.
pub fn apply_run_args(mut options: ConsoleOptions, args: &RunArgs) -> ConsoleOptions {
    if args.local {
        options.mirror_to_local = true;
    }
    if args.no_color {
        options.use_color = false;
    }
    if args.timestamps {
        options.log.auto_add_time_info = true;
    }
    if let Some(max) = args.max_log_length {
        options.log.max_total_text_length = max;
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::args::Command;
    use clap::Parser;

    #[test]
    fn run_flags_override_options() {
        let args = AppArgs::parse_from([
            "console-relay",
            "run",
            "--local",
            "--no-color",
            "--max-log-length",
            "42",
            "--",
            "echo",
            "hi",
        ]);
        let Command::Run(run) = &args.command else {
            panic!("expected run");
        };
        assert_eq!(run.command, vec!["echo", "hi"]);

        let options = apply_run_args(ConsoleOptions::default(), run);
        assert!(options.mirror_to_local);
        assert!(!options.use_color);
        assert!(!options.log.auto_add_time_info);
        assert_eq!(options.log.max_total_text_length, 42);
    }
}
