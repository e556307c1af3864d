//! Split program output into result segments.
//!
//! A hull program announces each answer with a line consisting exactly of [`RESULT_MARKER`]. Everything after that
//! line, up to the next marker line or the end of the stream, is one segment. Text before the first marker is not
//! part of any segment.

/// The marker line that introduces a reported hull.
pub const RESULT_MARKER: &str = "result";

/// Split output text into its result segments.
///
/// ## Parameters
/// - `output`: Raw text captured from a program.
///
/// ## Returns
/// - `Vec<String>`: One entry per marker line, in order. Segment text is kept byte-for-byte (trailing newlines and
///   whitespace included) because comparison is exact.
pub fn split_results(output: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for line in output.split_inclusive('\n') {
        if is_marker_line(line) {
            segments.push(String::new());
        } else if let Some(current) = segments.last_mut() {
            current.push_str(line);
        }
    }
    segments
}

/// Check whether the segments are exactly one empty segment (a marker with nothing after it).
pub fn is_single_empty(segments: &[String]) -> bool {
    matches!(segments, [only] if only.is_empty())
}

fn is_marker_line(line: &str) -> bool {
    line.strip_suffix('\n').unwrap_or(line) == RESULT_MARKER
}
