//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::thread;
use std::time::Duration;

use hulldiff_core::format_points;
use tracing::{info, warn};

use super::test_interfaces::{CancelFlag, SubprocessRunner};
use super::test_runner::{ConsoleReporter, Harness, JsonReporter, StopReason, TestReporter};
use super::{CliError, CliResult, ExitCode, OutputFormat, PointArgs, RunArgs};
use crate::config::{HarnessConfig, ProgramSpec};
use crate::input::{PointGenerator, builtin_cases, random_suite};

/// Build a validated [`HarnessConfig`] from `run` arguments.
pub fn build_config(args: &RunArgs) -> CliResult<HarnessConfig> {
    let timeout = parse_secs("--timeout", args.timeout)?;
    let deadline = args.deadline.map(|secs| parse_secs("--deadline", secs)).transpose()?;

    let config = HarnessConfig::new()
        .with_candidate(ProgramSpec::new(&args.candidate).with_args(args.candidate_args.iter().cloned()))
        .with_reference(ProgramSpec::new(&args.reference).with_args(args.reference_args.iter().cloned()))
        .with_coordinate_range(args.points.min..=args.points.max)
        .with_timeout(timeout)
        .with_iterations(args.iterations)
        .with_verbose(args.verbose)
        .with_seed(args.points.seed)
        .with_policy(args.policy.into())
        .with_check_exit_status(!args.ignore_exit_status)
        .with_stop_on_fail(args.stop_on_fail)
        .with_deadline(deadline);

    config.validate().map_err(|e| CliError::fatal(format!("Error: {}", e)))?;
    Ok(config)
}

fn parse_secs(flag: &str, secs: f64) -> CliResult<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| CliError::fatal(format!("Error: invalid {} value {}: {}", flag, secs, e)))
}

/// Run the built-in cases followed by the random suite.
pub fn run_harness(args: RunArgs) -> CliResult<ExitCode> {
    let config = build_config(&args)?;

    let generator = PointGenerator::new(config.coordinate_range.clone(), config.seed);
    info!(seed = generator.seed(), "point generator seeded (rerun with --seed to reproduce)");
    let config = config.with_seed(Some(generator.seed()));

    let cancel = CancelFlag::new();
    install_interrupt_handler(cancel.clone());

    let builtin = if args.no_builtin { Vec::new() } else { builtin_cases() };
    let cases = builtin.into_iter().chain(random_suite(generator, config.iterations));

    let runner = SubprocessRunner::new(config.timeout).with_cancel(cancel.clone());
    let harness = Harness::new(config, runner).with_cancel(cancel);

    let mut reporter: Box<dyn TestReporter> = match args.format {
        OutputFormat::Console => Box::new(ConsoleReporter::new(args.verbose)),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let summary = harness
        .run_suite(cases, reporter.as_mut())
        .map_err(|e| CliError::fatal(format!("Error: {}", e)))?;

    match summary.stop_reason {
        StopReason::Interrupted => Err(CliError::new("", ExitCode::INTERRUPTED)),
        // Summary already printed
        _ if summary.failed > 0 => Err(CliError::new("", ExitCode::FAILURE)),
        _ => Ok(ExitCode::SUCCESS),
    }
}

/// Print `count` random points.
pub fn generate_points(count: usize, args: &PointArgs) -> CliResult<ExitCode> {
    if args.min > args.max {
        return Err(CliError::fatal(format!(
            "Error: --min {} is greater than --max {}",
            args.min, args.max
        )));
    }
    let mut generator = PointGenerator::new(args.min..=args.max, args.seed);
    info!(seed = generator.seed(), "point generator seeded");
    print!("{}", format_points(&generator.points(count)));
    Ok(ExitCode::SUCCESS)
}

/// Print every built-in case with a header, or the raw text of one case.
pub fn print_cases(name: Option<&str>) -> CliResult<ExitCode> {
    let cases = builtin_cases();
    match name {
        Some(name) => {
            let case = cases.iter().find(|c| c.name == name).ok_or_else(|| {
                let known: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();
                CliError::failure(format!("Error: unknown case '{}' (known: {})", name, known.join(", ")))
            })?;
            print!("{}", case.text);
        }
        None => {
            for case in &cases {
                println!("# {}", case.name);
                print!("{}", case.text);
                println!();
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Flip `cancel` on Ctrl-C so the in-flight program is killed and the run stops cleanly.
fn install_interrupt_handler(cancel: CancelFlag) {
    let spawned = thread::Builder::new()
        .name("hulldiff-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("interrupt handling unavailable: {}", e);
                    return;
                }
            };
            runtime.block_on(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        warn!("interrupt received, stopping after cleaning up the running program");
                        cancel.cancel();
                    }
                    Err(e) => warn!("interrupt handling unavailable: {}", e),
                }
            });
        });

    if let Err(e) = spawned {
        warn!("interrupt handling unavailable: {}", e);
    }
}
