//! Differential test runner
//!
//! Feeds each [`TestInput`] to the candidate and then the reference program, splits both outputs into result
//! segments and compares them under the configured [`ComparisonPolicy`].
//!
//! ## TestReporter Trait
//!
//! Reporting is separated from execution through the `TestReporter` trait. `ConsoleReporter` prints a running,
//! human-readable log; `JsonReporter` prints one machine-readable summary at the end.
//!
//! ## Error policy
//!
//! Timeouts, undecodable output, non-zero exits and I/O trouble fail the current test and the run moves on. Only a
//! program that cannot be launched aborts the run. An interrupt or an exhausted deadline stops the run early but
//! still reports what was done.

use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use hulldiff_core::{ComparisonPolicy, Mismatch, MismatchKind, Verdict, compare, split_results};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::test_interfaces::{CancelFlag, ProgramOutput, ProgramRunner, RunError};
use crate::config::HarnessConfig;
use crate::input::TestInput;

// ============================================================================
// Results
// ============================================================================

/// Which of the two programs a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Candidate,
    Reference,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Candidate => "candidate",
            Side::Reference => "reference",
        }
    }
}

/// Why a single test failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Both programs ran, their results differ
    Mismatch(Mismatch),
    Timeout { side: Side, timeout: Duration },
    Decode { side: Side, bytes: Vec<u8> },
    NonZeroExit {
        side: Side,
        exit_code: Option<i32>,
        output: String,
    },
    Io { side: Side, message: String },
}

impl Failure {
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Mismatch(_) => "mismatch",
            Failure::Timeout { .. } => "timeout",
            Failure::Decode { .. } => "decode",
            Failure::NonZeroExit { .. } => "non_zero_exit",
            Failure::Io { .. } => "io",
        }
    }

    /// One-line description.
    pub fn reason(&self) -> String {
        match self {
            Failure::Mismatch(m) => match m.kind {
                MismatchKind::MissingCandidate => "candidate reported no result".to_string(),
                MismatchKind::MissingReference => "reference reported no result".to_string(),
                MismatchKind::SegmentDiffers { index } => {
                    format!("candidate result #{} differs from reference", index)
                }
                MismatchKind::CountDiffers { candidate, reference } => {
                    format!("candidate reported {} result(s), reference reported {}", candidate, reference)
                }
            },
            Failure::Timeout { side, timeout } => {
                format!("{} timed out after {}ms", side.as_str(), timeout.as_millis())
            }
            Failure::Decode { side, bytes } => {
                format!("{} wrote {} bytes that are not valid UTF-8", side.as_str(), bytes.len())
            }
            Failure::NonZeroExit { side, exit_code, .. } => match exit_code {
                Some(code) => format!("{} exited with status {}", side.as_str(), code),
                None => format!("{} was terminated by a signal", side.as_str()),
            },
            Failure::Io { side, message } => format!("I/O error talking to {}: {}", side.as_str(), message),
        }
    }
}

const RAW_BYTES_SHOWN: usize = 256;

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.reason())?;
        match self {
            Failure::Mismatch(m) => {
                writeln!(f, "candidate:")?;
                write_segment(f, m.candidate.as_deref())?;
                writeln!(f, "reference:")?;
                write_segment(f, m.reference.as_deref())
            }
            Failure::Decode { bytes, .. } => {
                let shown = &bytes[..bytes.len().min(RAW_BYTES_SHOWN)];
                writeln!(f, "raw bytes: {:?}", shown)?;
                if bytes.len() > RAW_BYTES_SHOWN {
                    writeln!(f, "... ({} more)", bytes.len() - RAW_BYTES_SHOWN)?;
                }
                Ok(())
            }
            Failure::NonZeroExit { output, .. } => {
                writeln!(f, "output:")?;
                write_segment(f, Some(output.as_str()))
            }
            Failure::Timeout { .. } | Failure::Io { .. } => Ok(()),
        }
    }
}

fn write_segment(f: &mut fmt::Formatter<'_>, segment: Option<&str>) -> fmt::Result {
    match segment {
        None => writeln!(f, "  <no result>"),
        Some("") => writeln!(f, "  <empty>"),
        Some(text) => {
            for line in text.lines() {
                writeln!(f, "  {}", line)?;
            }
            Ok(())
        }
    }
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed(Duration),
    Failed(Duration, Failure),
}

impl TestResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestResult::Passed(_))
    }

    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Passed(d) | TestResult::Failed(d, _) => *d,
        }
    }
}

/// The result segments of both programs, as handed to the comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub candidate: Vec<String>,
    pub reference: Vec<String>,
    pub policy: ComparisonPolicy,
}

impl Comparison {
    /// Segment pairs in the order the policy checks them, as `(candidate index, candidate, reference)`.
    pub fn pairs(&self) -> Vec<(usize, Option<&str>, Option<&str>)> {
        match self.policy {
            ComparisonPolicy::ReferenceFirst => {
                let reference = self.reference.first().map(String::as_str);
                self.candidate
                    .iter()
                    .enumerate()
                    .map(|(i, segment)| (i, Some(segment.as_str()), reference))
                    .collect()
            }
            ComparisonPolicy::Positional => {
                let count = self.candidate.len().max(self.reference.len());
                (0..count)
                    .map(|i| {
                        (
                            i,
                            self.candidate.get(i).map(String::as_str),
                            self.reference.get(i).map(String::as_str),
                        )
                    })
                    .collect()
            }
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return writeln!(f, "nothing to compare: candidate reported no result");
        }
        for (index, candidate, reference) in pairs {
            writeln!(f, "now comparing result #{}:", index)?;
            writeln!(f, "candidate:")?;
            write_segment(f, candidate)?;
            writeln!(f, "reference:")?;
            write_segment(f, reference)?;
        }
        Ok(())
    }
}

/// A failed test kept for the final report
#[derive(Debug, Clone)]
pub struct FailedCase {
    pub name: String,
    pub input: String,
    pub failure: Failure,
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    StopOnFail,
    Deadline,
    Interrupted,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::StopOnFail => "stop_on_fail",
            StopReason::Deadline => "deadline",
            StopReason::Interrupted => "interrupted",
        }
    }
}

/// Summary of test run
#[derive(Debug, Clone)]
pub struct TestSummary {
    pub planned: usize,
    pub passed: usize,
    pub failed: usize,
    pub stop_reason: StopReason,
    pub duration: Duration,
    pub seed: Option<u64>,
    pub policy: ComparisonPolicy,
    pub failures: Vec<FailedCase>,
}

impl TestSummary {
    fn new(planned: usize, seed: Option<u64>, policy: ComparisonPolicy) -> Self {
        Self {
            planned,
            passed: 0,
            failed: 0,
            stop_reason: StopReason::Completed,
            duration: Duration::ZERO,
            seed,
            policy,
            failures: Vec::new(),
        }
    }

    pub fn not_run(&self) -> usize {
        self.planned.saturating_sub(self.passed + self.failed)
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.stop_reason == StopReason::Completed
    }
}

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting test execution results.
pub trait TestReporter {
    /// Called once before the first test
    fn on_suite_start(&mut self, _config: &HarnessConfig, _planned: usize) {}

    /// Called when a test begins
    fn on_test_start(&mut self, input: &TestInput);

    /// Called with the segments of both programs right before they are compared
    fn on_comparison(&mut self, _input: &TestInput, _comparison: &Comparison) {}

    /// Called when a test completes
    fn on_test_complete(&mut self, input: &TestInput, result: &TestResult);

    /// Called when the run ends, including early stops and fatal errors
    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// Default console reporter
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    comparison: Option<Comparison>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            comparison: None,
        }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_suite_start(&mut self, config: &HarnessConfig, planned: usize) {
        println!("\x1b[1m=================== hulldiff session starts ===================\x1b[0m");
        println!("candidate: {}", config.candidate);
        println!("reference: {}", config.reference);
        println!("policy: {}", config.policy.as_str());
        if let Some(seed) = config.seed {
            println!("seed: {}", seed);
        }
        println!("planned {} test(s)", planned);
        println!();
    }

    fn on_test_start(&mut self, input: &TestInput) {
        if self.verbose {
            println!("--- {} ({} points)", input.name, input.point_count());
            print!("{}", input.text);
        }
        print!("{} ... ", input.name);
        let _ = io::stdout().flush();
    }

    fn on_comparison(&mut self, _input: &TestInput, comparison: &Comparison) {
        if self.verbose {
            self.comparison = Some(comparison.clone());
        }
    }

    fn on_test_complete(&mut self, input: &TestInput, result: &TestResult) {
        let comparison = self.comparison.take();
        match result {
            TestResult::Passed(d) => {
                if self.verbose {
                    println!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", d.as_millis());
                    if let Some(comparison) = &comparison {
                        print!("{}", comparison);
                    }
                } else {
                    println!("\x1b[32mPASSED\x1b[0m");
                }
            }
            TestResult::Failed(d, failure) => {
                if self.verbose {
                    println!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", d.as_millis());
                    if let Some(comparison) = &comparison {
                        print!("{}", comparison);
                    }
                } else {
                    println!("\x1b[31mFAILED\x1b[0m");
                }
                println!("---");
                println!("error in comparison, test was:");
                print!("{}", input.text);
                if input.text.is_empty() {
                    println!("  <empty input>");
                }
                print!("{}", failure);
                println!("===============================================================");
            }
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        println!();
        if !summary.failures.is_empty() {
            println!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for case in &summary.failures {
                println!("  {}: {}", case.name, case.failure.reason());
            }
            println!();
        }

        let summary_color = if summary.all_passed() {
            "\x1b[1;32m"
        } else {
            "\x1b[1;31m"
        };

        let mut parts = Vec::new();
        parts.push(format!("{} passed", summary.passed));
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed));
        }
        if summary.not_run() > 0 {
            parts.push(format!("{} not run", summary.not_run()));
        }
        if summary.stop_reason != StopReason::Completed {
            parts.push(format!("stopped: {}", summary.stop_reason.as_str()));
        }

        println!(
            "{}=================== {} in {:.2}s ===================\x1b[0m",
            summary_color,
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    name: &'a str,
    input: &'a str,
    kind: &'static str,
    reason: String,
    candidate: Option<&'a str>,
    reference: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    planned: usize,
    passed: usize,
    failed: usize,
    not_run: usize,
    stop_reason: &'static str,
    duration_secs: f64,
    seed: Option<u64>,
    policy: &'static str,
    failures: Vec<JsonFailure<'a>>,
}

impl<'a> From<&'a TestSummary> for JsonSummary<'a> {
    fn from(summary: &'a TestSummary) -> Self {
        let failures = summary
            .failures
            .iter()
            .map(|case| {
                let (candidate, reference) = match &case.failure {
                    Failure::Mismatch(m) => (m.candidate.as_deref(), m.reference.as_deref()),
                    Failure::NonZeroExit {
                        side: Side::Candidate,
                        output,
                        ..
                    } => (Some(output.as_str()), None),
                    Failure::NonZeroExit {
                        side: Side::Reference,
                        output,
                        ..
                    } => (None, Some(output.as_str())),
                    _ => (None, None),
                };
                JsonFailure {
                    name: &case.name,
                    input: &case.input,
                    kind: case.failure.kind(),
                    reason: case.failure.reason(),
                    candidate,
                    reference,
                }
            })
            .collect();

        JsonSummary {
            planned: summary.planned,
            passed: summary.passed,
            failed: summary.failed,
            not_run: summary.not_run(),
            stop_reason: summary.stop_reason.as_str(),
            duration_secs: summary.duration.as_secs_f64(),
            seed: summary.seed,
            policy: summary.policy.as_str(),
            failures,
        }
    }
}

/// Machine-readable reporter: writes one JSON document when the run completes.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_test_start(&mut self, input: &TestInput) {
        debug!(test = %input.name, "test started");
    }

    fn on_test_complete(&mut self, input: &TestInput, result: &TestResult) {
        debug!(test = %input.name, passed = result.is_passed(), "test finished");
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        let document = JsonSummary::from(summary);
        let written = serde_json::to_writer_pretty(&mut self.out, &document)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            error!("failed to write JSON summary: {}", e);
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Runs inputs through both programs and compares their results.
pub struct Harness<R: ProgramRunner> {
    config: HarnessConfig,
    runner: R,
    cancel: CancelFlag,
}

impl<R: ProgramRunner> Harness<R> {
    pub fn new(config: HarnessConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            cancel: CancelFlag::new(),
        }
    }

    /// Stop between tests once `cancel` is set.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run one input through both programs and compare.
    ///
    /// Per-test problems come back as `Ok(TestResult::Failed(..))`. Only [`RunError::Launch`] and
    /// [`RunError::Interrupted`] are returned as errors.
    pub fn run_single_test(&self, input: &TestInput) -> Result<TestResult, RunError> {
        self.run_and_compare(input).map(|(result, _)| result)
    }

    fn run_and_compare(&self, input: &TestInput) -> Result<(TestResult, Option<Comparison>), RunError> {
        let start = Instant::now();

        // The reference runs even after the candidate failed, so a reference that cannot be launched ends the run
        // on the first test.
        let candidate = self.capture(Side::Candidate, input)?;
        let reference = self.capture(Side::Reference, input)?;
        let (candidate, reference) = match (candidate, reference) {
            (Err(failure), _) | (Ok(_), Err(failure)) => {
                return Ok((TestResult::Failed(start.elapsed(), failure), None));
            }
            (Ok(candidate), Ok(reference)) => (candidate, reference),
        };

        let comparison = Comparison {
            candidate: split_results(&candidate.text),
            reference: split_results(&reference.text),
            policy: self.config.policy,
        };
        debug!(
            test = %input.name,
            candidate = ?comparison.candidate,
            reference = ?comparison.reference,
            "comparing"
        );

        let result = match compare(&comparison.candidate, &comparison.reference, comparison.policy) {
            Verdict::Match => TestResult::Passed(start.elapsed()),
            Verdict::Mismatch(m) => TestResult::Failed(start.elapsed(), Failure::Mismatch(m)),
        };
        Ok((result, Some(comparison)))
    }

    fn capture(&self, side: Side, input: &TestInput) -> Result<Result<ProgramOutput, Failure>, RunError> {
        let program = match side {
            Side::Candidate => &self.config.candidate,
            Side::Reference => &self.config.reference,
        };

        match self.runner.run(program, input.text.as_bytes()) {
            Ok(output) if self.config.check_exit_status && !output.success() => Ok(Err(Failure::NonZeroExit {
                side,
                exit_code: output.exit_code,
                output: output.text,
            })),
            Ok(output) => Ok(Ok(output)),
            Err(RunError::Timeout { timeout, .. }) => Ok(Err(Failure::Timeout { side, timeout })),
            Err(RunError::Decode { bytes, .. }) => Ok(Err(Failure::Decode { side, bytes })),
            Err(RunError::Io { source, .. }) => Ok(Err(Failure::Io {
                side,
                message: source.to_string(),
            })),
            Err(e) => Err(e),
        }
    }

    /// Run every input in order.
    ///
    /// Inputs are pulled from `cases` one at a time, so lazily generated inputs are created right before use.
    /// Returns the summary for completed and early-stopped runs; a launch failure is returned as the error after the
    /// reporter has seen the partial summary.
    pub fn run_suite<I>(&self, cases: I, reporter: &mut dyn TestReporter) -> Result<TestSummary, RunError>
    where
        I: IntoIterator<Item = TestInput>,
    {
        let cases = cases.into_iter();
        let planned = cases.size_hint().0;
        let start = Instant::now();
        let mut summary = TestSummary::new(planned, self.config.seed, self.config.policy);

        info!(planned, policy = self.config.policy.as_str(), "starting run");
        reporter.on_suite_start(&self.config, planned);

        for input in cases {
            if self.cancel.is_cancelled() {
                summary.stop_reason = StopReason::Interrupted;
                break;
            }
            if self.config.deadline.is_some_and(|d| start.elapsed() >= d) {
                warn!(test = %input.name, "run deadline reached, skipping remaining tests");
                summary.stop_reason = StopReason::Deadline;
                break;
            }

            reporter.on_test_start(&input);
            let result = match self.run_and_compare(&input) {
                Ok((result, comparison)) => {
                    if let Some(comparison) = &comparison {
                        reporter.on_comparison(&input, comparison);
                    }
                    result
                }
                Err(RunError::Interrupted { program }) => {
                    warn!(test = %input.name, %program, "run interrupted");
                    summary.stop_reason = StopReason::Interrupted;
                    break;
                }
                Err(e) => {
                    error!(test = %input.name, "aborting run: {}", e);
                    summary.duration = start.elapsed();
                    reporter.on_run_complete(&summary);
                    return Err(e);
                }
            };
            reporter.on_test_complete(&input, &result);

            match result {
                TestResult::Passed(_) => summary.passed += 1,
                TestResult::Failed(_, failure) => {
                    summary.failed += 1;
                    summary.failures.push(FailedCase {
                        name: input.name,
                        input: input.text,
                        failure,
                    });
                    if self.config.stop_on_fail {
                        summary.stop_reason = StopReason::StopOnFail;
                        break;
                    }
                }
            }
        }

        summary.duration = start.elapsed();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            not_run = summary.not_run(),
            stop_reason = summary.stop_reason.as_str(),
            "run finished"
        );
        reporter.on_run_complete(&summary);
        Ok(summary)
    }
}

// ============================================================================
// Tests
// ============================================================================
