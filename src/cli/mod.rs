//! CLI module for hulldiff
//!
//! ## Commands
//!
//! - `run` - Run the built-in cases and a random suite against both programs
//! - `gen <count>` - Print a random point set (to feed a program by hand)
//! - `cases [name]` - Print the built-in edge cases
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `test_interfaces` - Subprocess execution boundary
//! - `test_runner` - Comparison loop and reporters
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod test_interfaces;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hulldiff_core::ComparisonPolicy;

use crate::config::{DEFAULT_ITERATIONS, DEFAULT_TIMEOUT};
use crate::version::HULLDIFF_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// At least one test failed
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run could not proceed (bad configuration, program not launchable)
    pub const FATAL: ExitCode = ExitCode(2);
    pub const INTERRUPTED: ExitCode = ExitCode(130);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create a fatal error (exit code 2).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FATAL)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Differential tester for convex hull programs
#[derive(Parser, Debug)]
#[command(name = "hulldiff")]
#[command(version = HULLDIFF_VERSION)]
#[command(about = "Compare a convex hull solution against a reference solution", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the built-in cases and a random suite against both programs
    Run(RunArgs),

    /// Print a random point set
    Gen {
        /// Number of points
        #[arg(value_name = "COUNT")]
        count: usize,
        #[command(flatten)]
        points: PointArgs,
    },

    /// Print the built-in edge cases (or one of them by name)
    Cases {
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },
}

/// Options shared by commands that generate points
#[derive(Args, Debug, Clone)]
pub struct PointArgs {
    /// Seed for the point generator (random if omitted; the chosen seed is logged)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Smallest coordinate value
    #[arg(long, default_value_t = -2000, allow_negative_numbers = true)]
    pub min: i64,
    /// Largest coordinate value
    #[arg(long, default_value_t = 2000, allow_negative_numbers = true)]
    pub max: i64,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Solution under test
    #[arg(long, value_name = "PATH", default_value = "./ConvexHull")]
    pub candidate: PathBuf,
    /// Extra argument for the candidate (repeatable)
    #[arg(long = "candidate-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub candidate_args: Vec<String>,
    /// Reference ("school") solution
    #[arg(long, value_name = "PATH", default_value = "./SchoolSol")]
    pub reference: PathBuf,
    /// Extra argument for the reference (repeatable)
    #[arg(long = "reference-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub reference_args: Vec<String>,
    /// Number of random inputs (input i has i points)
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,
    #[command(flatten)]
    pub points: PointArgs,
    /// Per-program time budget in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
    pub timeout: f64,
    /// Wall-clock budget for the whole run in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<f64>,
    /// How candidate results are paired with reference results
    #[arg(long, value_enum, default_value_t = PolicyArg::ReferenceFirst)]
    pub policy: PolicyArg,
    /// Do not fail tests when a program exits with a non-zero status
    #[arg(long)]
    pub ignore_exit_status: bool,
    /// Skip the built-in edge cases
    #[arg(long)]
    pub no_builtin: bool,
    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Every candidate result against the reference's first result
    ReferenceFirst,
    /// Candidate result i against reference result i
    Positional,
}

impl From<PolicyArg> for ComparisonPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::ReferenceFirst => ComparisonPolicy::ReferenceFirst,
            PolicyArg::Positional => ComparisonPolicy::Positional,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Console,
    Json,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run(args) => commands::run_harness(args),
        Command::Gen { count, points } => commands::generate_points(count, &points),
        Command::Cases { name } => commands::print_cases(name.as_deref()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["hulldiff", "run"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.candidate, PathBuf::from("./ConvexHull"));
        assert_eq!(args.reference, PathBuf::from("./SchoolSol"));
        assert_eq!(args.iterations, 500);
        assert_eq!(args.points.min, -2000);
        assert_eq!(args.points.max, 2000);
        assert_eq!(args.timeout, 15.0);
        assert_eq!(args.policy, PolicyArg::ReferenceFirst);
        assert_eq!(args.format, OutputFormat::Console);
        assert!(!args.stop_on_fail);
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "hulldiff",
            "run",
            "--candidate",
            "./mine",
            "--reference",
            "./theirs",
            "-n",
            "20",
            "--seed",
            "5",
            "--min",
            "-10",
            "--max",
            "10",
            "--policy",
            "positional",
            "--format",
            "json",
            "-x",
            "-v",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.candidate, PathBuf::from("./mine"));
        assert_eq!(args.iterations, 20);
        assert_eq!(args.points.seed, Some(5));
        assert_eq!(args.points.min, -10);
        assert_eq!(args.policy, PolicyArg::Positional);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.stop_on_fail);
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_parse_program_args() {
        let cli = Cli::try_parse_from([
            "hulldiff",
            "run",
            "--candidate",
            "sh",
            "--candidate-arg",
            "-c",
            "--candidate-arg",
            "cat",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.candidate_args, vec!["-c".to_string(), "cat".to_string()]);
    }

    #[test]
    fn test_cli_parse_gen() {
        let cli = Cli::try_parse_from(["hulldiff", "gen", "50", "--seed", "1"]).unwrap();
        if let Command::Gen { count, points } = cli.command {
            assert_eq!(count, 50);
            assert_eq!(points.seed, Some(1));
        } else {
            panic!("Expected Gen command");
        }
    }

    #[test]
    fn test_cli_parse_cases() {
        let cli = Cli::try_parse_from(["hulldiff", "cases", "collinear"]).unwrap();
        assert!(matches!(cli.command, Command::Cases { name: Some(ref n) } if n == "collinear"));
    }

    #[test]
    fn test_policy_arg_conversion() {
        assert_eq!(ComparisonPolicy::from(PolicyArg::Positional), ComparisonPolicy::Positional);
        assert_eq!(
            ComparisonPolicy::from(PolicyArg::ReferenceFirst),
            ComparisonPolicy::ReferenceFirst
        );
    }
}
