//! Weighted scoring, grading and the run summary

use crate::result::{TestCategory, TestResult, TestStatus};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Letter grade derived from the score percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    /// Grade for a percentage; each threshold is an inclusive lower bound
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 95.0 => Grade::APlus,
            p if p >= 90.0 => Grade::A,
            p if p >= 85.0 => Grade::BPlus,
            p if p >= 80.0 => Grade::B,
            p if p >= 75.0 => Grade::CPlus,
            p if p >= 70.0 => Grade::C,
            p if p >= 60.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Total score and maximum score; SKIP results count toward neither
pub fn score(results: &[TestResult]) -> (f64, f64) {
    results
        .iter()
        .filter(|r| r.status != TestStatus::Skip)
        .fold((0.0, 0.0), |(total, max), r| (total + r.score(), max + r.weight))
}

/// `total / max * 100`, or 0 when nothing was scored
pub fn percentage(total: f64, max: f64) -> f64 {
    if max > 0.0 {
        total / max * 100.0
    } else {
        0.0
    }
}

/// Status counts of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CategoryCounts {
    pub pass: usize,
    pub fail: usize,
    pub warn: usize,
    pub skip: usize,
}

impl CategoryCounts {
    fn record(&mut self, status: TestStatus) {
        match status {
            TestStatus::Pass => self.pass += 1,
            TestStatus::Fail => self.fail += 1,
            TestStatus::Warn => self.warn += 1,
            TestStatus::Skip => self.skip += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail + self.warn + self.skip
    }
}

/// Aggregate of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warned: usize,
    pub skipped: usize,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub grade: Grade,
    /// Counts for the categories that produced results, in run order
    #[serde(serialize_with = "serialize_by_category")]
    pub by_category: BTreeMap<TestCategory, CategoryCounts>,
}

impl Summary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut by_category: BTreeMap<TestCategory, CategoryCounts> = BTreeMap::new();
        let mut totals = CategoryCounts::default();
        for result in results {
            totals.record(result.status);
            by_category.entry(result.category).or_default().record(result.status);
        }

        let (score, max_score) = score(results);
        let percentage = percentage(score, max_score);

        Self {
            total: results.len(),
            passed: totals.pass,
            failed: totals.fail,
            warned: totals.warn,
            skipped: totals.skip,
            score,
            max_score,
            percentage,
            grade: Grade::from_percentage(percentage),
            by_category,
        }
    }
}

fn serialize_by_category<S: Serializer>(
    by_category: &BTreeMap<TestCategory, CategoryCounts>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(by_category.len()))?;
    for (category, counts) in by_category {
        map.serialize_entry(category.name(), counts)?;
    }
    map.end()
}
