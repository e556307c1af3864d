//! Compare candidate result segments against reference result segments.
//!
//! ## Notes
//! - Equality is exact string equality. Point order, rotation and whitespace all matter.
//! - [`ComparisonPolicy::ReferenceFirst`] keeps the historical contract: every candidate segment is checked against
//!   the reference's *first* segment only. [`ComparisonPolicy::Positional`] pairs segment `i` with segment `i` and
//!   also fails on a count difference.
//! - A candidate with no segments matches a reference with no segments, or with one empty segment, under both
//!   policies.

use crate::segments::is_single_empty;

/// How candidate segments are paired with reference segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonPolicy {
    /// Every candidate segment against reference segment 0.
    #[default]
    ReferenceFirst,
    /// Candidate segment `i` against reference segment `i`, counts must agree.
    Positional,
}

impl ComparisonPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonPolicy::ReferenceFirst => "reference-first",
            ComparisonPolicy::Positional => "positional",
        }
    }
}

/// Why two outputs were judged different.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// The candidate reported nothing while the reference reported a hull.
    MissingCandidate,
    /// The candidate reported a hull while the reference reported none.
    MissingReference,
    /// Segment text differs; `index` is the candidate segment.
    SegmentDiffers { index: usize },
    /// Positional only: same prefix, different number of segments.
    CountDiffers { candidate: usize, reference: usize },
}

/// A failed comparison with the text needed to show it to a human.
///
/// `None` means the side had no segment to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub candidate: Option<String>,
    pub reference: Option<String>,
}

/// Outcome of comparing two segment lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch(Mismatch),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }
}

/// Compare candidate segments with reference segments.
///
/// ## Parameters
/// - `candidate`: Segments split from the program under test.
/// - `reference`: Segments split from the reference program.
/// - `policy`: How segments are paired.
///
/// ## Returns
/// - `Verdict`: `Match`, or the first mismatch found. Comparison stops at the first difference.
pub fn compare(candidate: &[String], reference: &[String], policy: ComparisonPolicy) -> Verdict {
    if candidate.is_empty() {
        if reference.is_empty() || is_single_empty(reference) {
            return Verdict::Match;
        }
        return Verdict::Mismatch(Mismatch {
            kind: MismatchKind::MissingCandidate,
            candidate: None,
            reference: reference.first().cloned(),
        });
    }

    match policy {
        ComparisonPolicy::ReferenceFirst => compare_reference_first(candidate, reference),
        ComparisonPolicy::Positional => compare_positional(candidate, reference),
    }
}

fn compare_reference_first(candidate: &[String], reference: &[String]) -> Verdict {
    let Some(expected) = reference.first() else {
        return Verdict::Mismatch(Mismatch {
            kind: MismatchKind::MissingReference,
            candidate: candidate.first().cloned(),
            reference: None,
        });
    };

    for (index, segment) in candidate.iter().enumerate() {
        if segment != expected {
            return Verdict::Mismatch(Mismatch {
                kind: MismatchKind::SegmentDiffers { index },
                candidate: Some(segment.clone()),
                reference: Some(expected.clone()),
            });
        }
    }
    Verdict::Match
}

fn compare_positional(candidate: &[String], reference: &[String]) -> Verdict {
    if reference.is_empty() {
        return Verdict::Mismatch(Mismatch {
            kind: MismatchKind::MissingReference,
            candidate: candidate.first().cloned(),
            reference: None,
        });
    }

    for (index, (got, expected)) in candidate.iter().zip(reference).enumerate() {
        if got != expected {
            return Verdict::Mismatch(Mismatch {
                kind: MismatchKind::SegmentDiffers { index },
                candidate: Some(got.clone()),
                reference: Some(expected.clone()),
            });
        }
    }

    if candidate.len() != reference.len() {
        let first_unpaired = candidate.len().min(reference.len());
        return Verdict::Mismatch(Mismatch {
            kind: MismatchKind::CountDiffers {
                candidate: candidate.len(),
                reference: reference.len(),
            },
            candidate: candidate.get(first_unpaired).cloned(),
            reference: reference.get(first_unpaired).cloned(),
        });
    }
    Verdict::Match
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_single_segment_matches() {
        let a = segs(&["1,1\n4,5\n1,3\n"]);
        for policy in [ComparisonPolicy::ReferenceFirst, ComparisonPolicy::Positional] {
            assert!(compare(&a, &a, policy).is_match());
        }
    }

    #[test]
    fn test_both_empty_matches() {
        for policy in [ComparisonPolicy::ReferenceFirst, ComparisonPolicy::Positional] {
            assert!(compare(&[], &[], policy).is_match());
        }
    }

    #[test]
    fn test_empty_candidate_vs_single_empty_reference_matches() {
        assert!(compare(&[], &segs(&[""]), ComparisonPolicy::ReferenceFirst).is_match());
        assert!(compare(&[], &segs(&[""]), ComparisonPolicy::Positional).is_match());
    }

    #[test]
    fn test_empty_candidate_vs_reference_hull_fails() {
        let verdict = compare(&[], &segs(&["1,1\n3,3\n"]), ComparisonPolicy::ReferenceFirst);
        let Verdict::Mismatch(m) = verdict else {
            panic!("expected mismatch");
        };
        assert_eq!(m.kind, MismatchKind::MissingCandidate);
        assert_eq!(m.candidate, None);
        assert_eq!(m.reference.as_deref(), Some("1,1\n3,3\n"));
    }

    #[test]
    fn test_whitespace_is_significant() {
        let verdict = compare(&segs(&["1,1\n"]), &segs(&["1,1 \n"]), ComparisonPolicy::ReferenceFirst);
        assert!(!verdict.is_match());
    }

    #[test]
    fn test_reference_first_ignores_later_reference_segments() {
        // Candidate repeats the first hull; the reference's second hull is never looked at.
        let candidate = segs(&["a\n", "a\n"]);
        let reference = segs(&["a\n", "b\n"]);
        assert!(compare(&candidate, &reference, ComparisonPolicy::ReferenceFirst).is_match());
        assert!(!compare(&candidate, &reference, ComparisonPolicy::Positional).is_match());
    }

    #[test]
    fn test_reference_first_stops_at_first_difference() {
        let candidate = segs(&["a\n", "x\n", "y\n"]);
        let reference = segs(&["a\n"]);
        let Verdict::Mismatch(m) = compare(&candidate, &reference, ComparisonPolicy::ReferenceFirst) else {
            panic!("expected mismatch");
        };
        assert_eq!(m.kind, MismatchKind::SegmentDiffers { index: 1 });
        assert_eq!(m.candidate.as_deref(), Some("x\n"));
        assert_eq!(m.reference.as_deref(), Some("a\n"));
    }

    #[test]
    fn test_candidate_segments_without_reference_do_not_panic() {
        for policy in [ComparisonPolicy::ReferenceFirst, ComparisonPolicy::Positional] {
            let Verdict::Mismatch(m) = compare(&segs(&["a\n"]), &[], policy) else {
                panic!("expected mismatch");
            };
            assert_eq!(m.kind, MismatchKind::MissingReference);
            assert_eq!(m.reference, None);
        }
    }

    #[test]
    fn test_positional_count_difference() {
        let candidate = segs(&["a\n"]);
        let reference = segs(&["a\n", "b\n"]);
        let Verdict::Mismatch(m) = compare(&candidate, &reference, ComparisonPolicy::Positional) else {
            panic!("expected mismatch");
        };
        assert_eq!(
            m.kind,
            MismatchKind::CountDiffers {
                candidate: 1,
                reference: 2
            }
        );
        assert_eq!(m.candidate, None);
        assert_eq!(m.reference.as_deref(), Some("b\n"));
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(ComparisonPolicy::default(), ComparisonPolicy::ReferenceFirst);
        assert_eq!(ComparisonPolicy::ReferenceFirst.as_str(), "reference-first");
        assert_eq!(ComparisonPolicy::Positional.as_str(), "positional");
    }
}
