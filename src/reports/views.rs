use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{EducationLevel, ExperimentGroup};

/// One row of the nationality table, count ascending.
///
/// Name and ISO3 stay `None` when the group key is absent from the ISO
/// dataset; `count_pct` is present only on normalized tables.
#[derive(Debug, Clone, Serialize)]
pub struct NationalityEntry {
    pub country_iso2: String,
    pub country_name: Option<&'static str>,
    pub country_iso3: Option<&'static str>,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_pct: Option<f64>,
}

/// One row of the education table, in fixed attainment order.
#[derive(Debug, Clone, Serialize)]
pub struct EducationEntry {
    pub level: EducationLevel,
    pub level_label: &'static str,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_pct: Option<f64>,
}

/// One five-year bucket of the age histogram.
#[derive(Debug, Clone, Serialize)]
pub struct AgeBucketEntry {
    pub lower: i64,
    pub upper: i64,
    pub count: usize,
}

/// Age histogram plus summary statistics over the extracted ages.
#[derive(Debug, Clone, Serialize)]
pub struct AgeDistribution {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    pub buckets: Vec<AgeBucketEntry>,
}

/// Quiz-incomplete applicants observed on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyNoQuizEntry {
    pub day: NaiveDate,
    pub count: i64,
}

/// Quiz outcomes tallied for one slice of the experiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuizOutcomeCounts {
    pub complete: u64,
    pub incomplete: u64,
}

impl QuizOutcomeCounts {
    pub const fn total(self) -> u64 {
        self.complete + self.incomplete
    }
}

/// One row of the 2x2 contingency table.
#[derive(Debug, Clone, Serialize)]
pub struct ContingencyRow {
    pub group: ExperimentGroup,
    pub group_label: &'static str,
    pub complete: u64,
    pub incomplete: u64,
    pub total: u64,
}

/// Crosstab of experiment group by quiz completion, control row first.
#[derive(Debug, Clone, Serialize)]
pub struct ContingencyTable {
    pub rows: Vec<ContingencyRow>,
}

impl ContingencyTable {
    /// Column totals across both groups.
    pub fn column_totals(&self) -> QuizOutcomeCounts {
        self.rows.iter().fold(
            QuizOutcomeCounts::default(),
            |totals, row| QuizOutcomeCounts {
                complete: totals.complete + row.complete,
                incomplete: totals.incomplete + row.incomplete,
            },
        )
    }

    pub fn grand_total(&self) -> u64 {
        self.column_totals().total()
    }
}
