#![forbid(unsafe_code)]
//! hulldiff: differential tester for convex hull programs
//!
//! Feeds the same point sets to a candidate solution and a reference solution, splits each program's output into
//! `result` segments and reports every textual difference. The hull computation itself lives in the two external
//! programs; this crate only spawns, captures and compares.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod input;
pub mod version;

pub use cli::test_interfaces::{CancelFlag, ProgramOutput, ProgramRunner, RunError, SubprocessRunner};
pub use cli::test_runner::{
    Comparison, ConsoleReporter, Failure, Harness, JsonReporter, Side, StopReason, TestReporter, TestResult,
    TestSummary,
};
pub use config::{ConfigError, HarnessConfig, ProgramSpec};
pub use input::{PointGenerator, TestInput, builtin_cases, random_suite};
