//! Test inputs: the built-in edge cases and randomly generated point sets.

use std::ops::RangeInclusive;

use hulldiff_core::{Point, format_points};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Four points with a clear hull.
pub const BASIC_CASE: &str = "1,1\n2,2\n1,3\n4,5\n";
/// Three collinear points: the hull is degenerate.
pub const COLLINEAR_CASE: &str = "1,1\n2,2\n3,3\n";
/// Collinear triple plus a point above the line.
pub const COLLINEAR_INTERIOR_CASE: &str = "1,1\n2,2\n3,3\n1,3\n";
/// Collinear triple plus a point below the line.
pub const COLLINEAR_OFFLINE_CASE: &str = "1,1\n2,2\n3,3\n3,1\n";

/// One input fed to both programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestInput {
    /// Name shown in reports
    pub name: String,
    /// Text written to the programs' stdin
    pub text: String,
}

impl TestInput {
    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Draw `count` points from `generator`; the input is named `random_<count>`.
    pub fn random(generator: &mut PointGenerator, count: usize) -> Self {
        Self::literal(format!("random_{count}"), format_points(&generator.points(count)))
    }

    /// Number of point lines in the input.
    pub fn point_count(&self) -> usize {
        self.text.lines().filter(|l| !l.trim().is_empty()).count()
    }
}

/// The hand-authored edge cases, in run order.
pub fn builtin_cases() -> Vec<TestInput> {
    vec![
        TestInput::literal("basic", BASIC_CASE),
        TestInput::literal("collinear", COLLINEAR_CASE),
        TestInput::literal("collinear_interior", COLLINEAR_INTERIOR_CASE),
        TestInput::literal("collinear_offline", COLLINEAR_OFFLINE_CASE),
    ]
}

/// Seeded generator for random point sets.
///
/// Coordinates are drawn independently and uniformly from an inclusive range. Nothing prevents duplicates.
#[derive(Debug, Clone)]
pub struct PointGenerator {
    rng: StdRng,
    range: RangeInclusive<i64>,
    seed: u64,
}

impl PointGenerator {
    /// Create a generator. Without a seed one is drawn from the thread RNG; read it back with [`Self::seed`].
    pub fn new(range: RangeInclusive<i64>, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Self {
            rng: StdRng::seed_from_u64(seed),
            range,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn points(&mut self, count: usize) -> Vec<Point> {
        (0..count)
            .map(|_| {
                let x = self.rng.random_range(self.range.clone());
                let y = self.rng.random_range(self.range.clone());
                Point::new(x, y)
            })
            .collect()
    }

    /// Generate an input of `count` points named `random_<count>`.
    pub fn input(&mut self, count: usize) -> TestInput {
        TestInput::random(self, count)
    }
}

/// Lazily generate inputs of `0..iterations` points; each is built right before it is run.
pub fn random_suite(mut generator: PointGenerator, iterations: usize) -> impl Iterator<Item = TestInput> {
    (0..iterations).map(move |count| generator.input(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hulldiff_core::parse_points;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_cases_order_and_content() {
        let cases = builtin_cases();
        let names: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["basic", "collinear", "collinear_interior", "collinear_offline"]);
        assert_eq!(cases[0].text, "1,1\n2,2\n1,3\n4,5\n");
        assert_eq!(cases[1].point_count(), 3);
        for case in &cases {
            assert!(parse_points(&case.text).is_ok(), "{} is not valid point text", case.name);
        }
    }

    #[test]
    fn test_generator_line_count_and_range() {
        let mut generator = PointGenerator::new(-5..=5, Some(1));
        let input = generator.input(200);
        assert_eq!(input.name, "random_200");
        assert_eq!(input.point_count(), 200);
        for p in parse_points(&input.text).unwrap() {
            assert!((-5..=5).contains(&p.x) && (-5..=5).contains(&p.y));
        }
    }

    #[test]
    fn test_random_input_draws_from_generator() {
        let mut generator = PointGenerator::new(-3..=3, Some(5));
        let input = TestInput::random(&mut generator, 12);
        assert_eq!(input.name, "random_12");
        assert_eq!(input.point_count(), 12);
        assert_eq!(input, PointGenerator::new(-3..=3, Some(5)).input(12));
    }

    #[test]
    fn test_generator_zero_points() {
        let mut generator = PointGenerator::new(-2000..=2000, Some(1));
        let input = generator.input(0);
        assert_eq!(input.text, "");
        assert_eq!(input.point_count(), 0);
    }

    #[test]
    fn test_same_seed_same_points() {
        let a = PointGenerator::new(-2000..=2000, Some(42)).input(50);
        let b = PointGenerator::new(-2000..=2000, Some(42)).input(50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unseeded_generator_reports_seed() {
        let generator = PointGenerator::new(-2000..=2000, None);
        let seed = generator.seed();
        let replay = PointGenerator::new(-2000..=2000, Some(seed));
        assert_eq!(replay.seed(), seed);
    }

    #[test]
    fn test_small_range_produces_duplicates() {
        let points = PointGenerator::new(0..=1, Some(9)).points(50);
        let unique: HashSet<_> = points.iter().collect();
        assert!(unique.len() < points.len());
    }

    #[test]
    fn test_random_suite_sizes_increase() {
        let sizes: Vec<_> = random_suite(PointGenerator::new(-10..=10, Some(3)), 5)
            .map(|input| input.point_count())
            .collect();
        assert_eq!(sizes, vec![0, 1, 2, 3, 4]);
    }
}
