//! Harness configuration
//!
//! Everything the original harness kept in process-wide constants lives here and is handed to the
//! [`Harness`](crate::cli::test_runner::Harness) at construction.

use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use hulldiff_core::ComparisonPolicy;
use thiserror::Error;

/// Default coordinate range for generated points (inclusive).
pub const DEFAULT_COORDINATE_RANGE: RangeInclusive<i64> = -2000..=2000;
/// Default per-program time budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Default number of random inputs (sizes `0..iterations`).
pub const DEFAULT_ITERATIONS: usize = 500;

/// Errors raised by [`HarnessConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid coordinate range: min {min} is greater than max {max}")]
    InvertedRange { min: i64, max: i64 },

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("{side} program path is empty")]
    EmptyProgramPath { side: &'static str },
}

/// An external program: executable path plus fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSpec {
    pub path: PathBuf,
    pub args: Vec<String>,
}

impl ProgramSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Append fixed arguments passed on every invocation.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ProgramSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Solution under test
    pub candidate: ProgramSpec,
    /// Trusted reference solution
    pub reference: ProgramSpec,
    /// Inclusive range both coordinates are drawn from
    pub coordinate_range: RangeInclusive<i64>,
    /// Time budget for one program invocation
    pub timeout: Duration,
    /// Number of random inputs to run after the built-in cases
    pub iterations: usize,
    /// Print every input and timing
    pub verbose: bool,
    /// Seed for the point generator; `None` draws one and logs it
    pub seed: Option<u64>,
    /// How candidate segments are paired with reference segments
    pub policy: ComparisonPolicy,
    /// Treat a non-zero exit status as a failure
    pub check_exit_status: bool,
    /// Stop after the first failing test
    pub stop_on_fail: bool,
    /// Wall-clock budget for the whole run
    pub deadline: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            candidate: ProgramSpec::new("./ConvexHull"),
            reference: ProgramSpec::new("./SchoolSol"),
            coordinate_range: DEFAULT_COORDINATE_RANGE,
            timeout: DEFAULT_TIMEOUT,
            iterations: DEFAULT_ITERATIONS,
            verbose: false,
            seed: None,
            policy: ComparisonPolicy::default(),
            check_exit_status: true,
            stop_on_fail: false,
            deadline: None,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidate(mut self, program: ProgramSpec) -> Self {
        self.candidate = program;
        self
    }

    pub fn with_reference(mut self, program: ProgramSpec) -> Self {
        self.reference = program;
        self
    }

    pub fn with_coordinate_range(mut self, range: RangeInclusive<i64>) -> Self {
        self.coordinate_range = range;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_policy(mut self, policy: ComparisonPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_check_exit_status(mut self, check: bool) -> Self {
        self.check_exit_status = check;
        self
    }

    pub fn with_stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Reject settings the harness cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (*self.coordinate_range.start(), *self.coordinate_range.end());
        if min > max {
            return Err(ConfigError::InvertedRange { min, max });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.candidate.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyProgramPath { side: "candidate" });
        }
        if self.reference.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyProgramPath { side: "reference" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.candidate.path, PathBuf::from("./ConvexHull"));
        assert_eq!(config.reference.path, PathBuf::from("./SchoolSol"));
        assert_eq!(config.coordinate_range, -2000..=2000);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.iterations, 500);
        assert_eq!(config.policy, ComparisonPolicy::ReferenceFirst);
        assert!(config.check_exit_status);
        assert!(!config.verbose);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = HarnessConfig::new()
            .with_candidate(ProgramSpec::new("sh").with_args(["-c", "cat"]))
            .with_iterations(3)
            .with_seed(Some(7))
            .with_policy(ComparisonPolicy::Positional)
            .with_timeout(Duration::from_millis(250));

        assert_eq!(config.candidate.args, vec!["-c".to_string(), "cat".to_string()]);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.policy, ComparisonPolicy::Positional);
        assert_eq!(config.timeout, Duration::from_millis(250));
        // Untouched fields keep defaults
        assert_eq!(config.reference.path, PathBuf::from("./SchoolSol"));
    }

    #[test]
    fn test_validate_inverted_range() {
        #[allow(clippy::reversed_empty_ranges)]
        let config = HarnessConfig::new().with_coordinate_range(5..=-5);
        assert_eq!(config.validate(), Err(ConfigError::InvertedRange { min: 5, max: -5 }));
    }

    #[test]
    fn test_validate_single_value_range() {
        let config = HarnessConfig::new().with_coordinate_range(3..=3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = HarnessConfig::new().with_timeout(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn test_validate_empty_path() {
        let config = HarnessConfig::new().with_reference(ProgramSpec::new(""));
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyProgramPath { side: "reference" })
        );
    }

    #[test]
    fn test_program_spec_display() {
        let spec = ProgramSpec::new("./SchoolSol").with_args(["--quiet"]);
        assert_eq!(spec.to_string(), "./SchoolSol --quiet");
    }
}
