use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use tracing::debug;

use super::countries;
use super::domain::{EducationLevel, ExperimentGroup, QuizStatus};
use super::repository::{ApplicantRepository, RepositoryError};
use super::views::{
    AgeBucketEntry, AgeDistribution, ContingencyRow, ContingencyTable, DailyNoQuizEntry,
    EducationEntry, NationalityEntry, QuizOutcomeCounts,
};

const AGE_BUCKET_YEARS: i64 = 5;

/// Service reshaping raw repository rows into the tabular views.
///
/// All grouping and counting already happened inside the database; this
/// layer sorts, joins the country lookup, applies the fixed education
/// ordering, normalizes counts to percentages, and tallies the crosstab.
pub struct ApplicantReportService<R> {
    repository: Arc<R>,
}

impl<R> ApplicantReportService<R>
where
    R: ApplicantRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Applicants per nationality, count ascending, enriched with the
    /// country name and ISO3 code. `normalize` adds a percentage column.
    pub async fn nationality_breakdown(
        &self,
        normalize: bool,
    ) -> Result<Vec<NationalityEntry>, ReportError> {
        let mut rows = self.repository.nationality_counts().await?;
        rows.sort_by(|a, b| {
            a.count
                .cmp(&b.count)
                .then_with(|| a.country_iso2.cmp(&b.country_iso2))
        });

        let total: i64 = rows.iter().map(|row| row.count).sum();
        debug!(rows = rows.len(), total, "nationality breakdown assembled");

        Ok(rows
            .into_iter()
            .map(|row| {
                let details = countries::lookup(&row.country_iso2);
                NationalityEntry {
                    country_name: details.map(|d| d.name),
                    country_iso3: details.map(|d| d.iso3),
                    count_pct: percentage(normalize, row.count, total),
                    country_iso2: row.country_iso2,
                    count: row.count,
                }
            })
            .collect())
    }

    /// Applicant ages in years, exactly as extracted by the database.
    pub async fn ages(&self) -> Result<Vec<i64>, ReportError> {
        Ok(self.repository.ages().await?)
    }

    /// Five-year age histogram with count/min/max/mean over the ages.
    pub async fn age_distribution(&self) -> Result<AgeDistribution, ReportError> {
        let ages = self.repository.ages().await?;
        Ok(bucket_ages(&ages))
    }

    /// Applicants per education level in fixed attainment order. Levels
    /// absent from the data are omitted; labels outside the known five are
    /// an error.
    pub async fn education_breakdown(
        &self,
        normalize: bool,
    ) -> Result<Vec<EducationEntry>, ReportError> {
        let rows = self.repository.education_counts().await?;

        let mut counts: HashMap<EducationLevel, i64> = HashMap::new();
        for row in rows {
            let level = EducationLevel::from_label(&row.level)
                .ok_or_else(|| ReportError::UnknownEducationLevel(row.level.clone()))?;
            *counts.entry(level).or_default() += row.count;
        }

        let total: i64 = counts.values().sum();
        debug!(levels = counts.len(), total, "education breakdown assembled");

        Ok(EducationLevel::ordered()
            .into_iter()
            .filter_map(|level| {
                counts.get(&level).map(|&count| EducationEntry {
                    level,
                    level_label: level.label(),
                    count,
                    count_pct: percentage(normalize, count, total),
                })
            })
            .collect())
    }

    /// Quiz-incomplete applicants per calendar day, day ascending.
    pub async fn no_quiz_per_day(&self) -> Result<Vec<DailyNoQuizEntry>, ReportError> {
        let rows = self.repository.no_quiz_daily_counts().await?;

        let mut entries = rows
            .into_iter()
            .map(|row| {
                let millis = row.day.timestamp_millis();
                let day = DateTime::from_timestamp_millis(millis)
                    .map(|dt| dt.date_naive())
                    .ok_or(ReportError::UnrepresentableDay(millis))?;
                Ok(DailyNoQuizEntry {
                    day,
                    count: row.count,
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        entries.sort_by_key(|entry| entry.day);
        Ok(entries)
    }

    /// 2x2 crosstab of experiment group by quiz completion over the
    /// in-experiment applicants, control row first.
    pub async fn contingency_table(&self) -> Result<ContingencyTable, ReportError> {
        let observations = self.repository.experiment_observations().await?;

        let mut tallies: HashMap<ExperimentGroup, QuizOutcomeCounts> = HashMap::new();
        for observation in observations {
            let group = ExperimentGroup::from_label(&observation.group)
                .ok_or_else(|| ReportError::UnknownExperimentGroup(observation.group.clone()))?;
            let status = QuizStatus::from_label(&observation.admissions_quiz).ok_or_else(|| {
                ReportError::UnknownQuizStatus(observation.admissions_quiz.clone())
            })?;

            let cell = tallies.entry(group).or_default();
            match status {
                QuizStatus::Complete => cell.complete += 1,
                QuizStatus::Incomplete => cell.incomplete += 1,
            }
        }

        let rows = ExperimentGroup::ordered()
            .into_iter()
            .map(|group| {
                let outcomes = tallies.get(&group).copied().unwrap_or_default();
                ContingencyRow {
                    group,
                    group_label: group.label(),
                    complete: outcomes.complete,
                    incomplete: outcomes.incomplete,
                    total: outcomes.total(),
                }
            })
            .collect();

        Ok(ContingencyTable { rows })
    }
}

fn percentage(normalize: bool, count: i64, total: i64) -> Option<f64> {
    if normalize && total > 0 {
        Some(count as f64 / total as f64 * 100.0)
    } else {
        None
    }
}

fn bucket_ages(ages: &[i64]) -> AgeDistribution {
    let count = ages.len();
    let (Some(&min), Some(&max)) = (ages.iter().min(), ages.iter().max()) else {
        return AgeDistribution {
            count: 0,
            min: None,
            max: None,
            mean: None,
            buckets: Vec::new(),
        };
    };

    let sum: i64 = ages.iter().sum();
    let mean = sum as f64 / count as f64;

    let first = min.div_euclid(AGE_BUCKET_YEARS) * AGE_BUCKET_YEARS;
    let last = max.div_euclid(AGE_BUCKET_YEARS) * AGE_BUCKET_YEARS;

    let mut buckets = Vec::new();
    let mut lower = first;
    while lower <= last {
        let upper = lower + AGE_BUCKET_YEARS - 1;
        let bucket_count = ages
            .iter()
            .filter(|&&age| age >= lower && age <= upper)
            .count();
        buckets.push(AgeBucketEntry {
            lower,
            upper,
            count: bucket_count,
        });
        lower += AGE_BUCKET_YEARS;
    }

    AgeDistribution {
        count,
        min: Some(min),
        max: Some(max),
        mean: Some(mean),
        buckets,
    }
}

/// Error raised by the report service.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("unknown education level '{0}' in applicant data")]
    UnknownEducationLevel(String),
    #[error("unknown experiment group '{0}' in applicant data")]
    UnknownExperimentGroup(String),
    #[error("unknown quiz status '{0}' in applicant data")]
    UnknownQuizStatus(String),
    #[error("day timestamp {0}ms is not a representable date")]
    UnrepresentableDay(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_ages_handles_empty_input() {
        let distribution = bucket_ages(&[]);
        assert_eq!(distribution.count, 0);
        assert!(distribution.buckets.is_empty());
        assert!(distribution.mean.is_none());
    }

    #[test]
    fn bucket_ages_covers_gaps_between_observed_buckets() {
        let distribution = bucket_ages(&[21, 22, 34]);
        assert_eq!(distribution.count, 3);
        assert_eq!(distribution.min, Some(21));
        assert_eq!(distribution.max, Some(34));

        let bounds: Vec<(i64, i64, usize)> = distribution
            .buckets
            .iter()
            .map(|bucket| (bucket.lower, bucket.upper, bucket.count))
            .collect();
        assert_eq!(bounds, [(20, 24, 2), (25, 29, 0), (30, 34, 1)]);
    }

    #[test]
    fn percentage_only_applies_when_normalizing() {
        assert_eq!(percentage(false, 5, 10), None);
        assert_eq!(percentage(true, 5, 10), Some(50.0));
        assert_eq!(percentage(true, 0, 0), None);
    }
}
