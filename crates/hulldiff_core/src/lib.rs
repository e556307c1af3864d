//! Provide the pure helpers behind the hulldiff harness: point formatting, result-segment splitting and the
//! comparison policies applied to two programs' outputs.
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state, no process handling.
//! - Everything here is deterministic so the harness, its tests and any future reporter agree on what counts as a
//!   mismatch.

pub mod compare;
pub mod points;
pub mod segments;

pub use compare::{ComparisonPolicy, Mismatch, MismatchKind, Verdict, compare};
pub use points::{Point, PointParseError, format_points, parse_points};
pub use segments::{RESULT_MARKER, is_single_empty, split_results};
