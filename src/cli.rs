//! CLI command definitions using clap.

use clap::{Parser, Subcommand};

/// Gradr - automated assignment download, AI review, and grade submission
#[derive(Parser, Debug)]
#[command(name = "gradr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute; a bare invocation runs the full grading pass
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full grading pass over all pending submissions
    Run,

    /// Check API availability without starting a batch
    Probe,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args_defaults_to_run() {
        let cli = Cli::try_parse_from(["gradr"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::try_parse_from(["gradr", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_probe_command() {
        let cli = Cli::try_parse_from(["gradr", "probe"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Probe)));
    }

    #[test]
    fn test_verbose_flag() {
        let cli = Cli::try_parse_from(["gradr", "-v", "probe"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        // Version flag causes early exit with error (expected)
        let result = Cli::try_parse_from(["gradr", "--version"]);
        assert!(result.is_err());
    }
}
