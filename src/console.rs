use applicant_insights::config::AppConfig;
use applicant_insights::error::AppError;
use applicant_insights::reports::{
    AgeDistribution, ApplicantReportService, ContingencyTable, DailyNoQuizEntry, EducationEntry,
    MongoApplicantRepository, NationalityEntry,
};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct NationalityArgs {
    /// Print raw counts instead of the default percentage column
    #[arg(long)]
    pub(crate) raw_counts: bool,
    /// Export the table as CSV to the given path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AgesArgs {
    /// Export the age buckets as CSV to the given path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct EducationArgs {
    /// Add a percentage column to the counts
    #[arg(long)]
    pub(crate) normalize: bool,
    /// Export the table as CSV to the given path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct NoQuizArgs {
    /// Export the table as CSV to the given path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ContingencyArgs {
    /// Export the table as CSV to the given path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

async fn connect_service() -> Result<ApplicantReportService<MongoApplicantRepository>, AppError> {
    let config = AppConfig::load()?;
    let repository = MongoApplicantRepository::connect(&config.database).await?;
    Ok(ApplicantReportService::new(Arc::new(repository)))
}

pub(crate) async fn run_nationality_report(args: NationalityArgs) -> Result<(), AppError> {
    let service = connect_service().await?;
    let entries = service.nationality_breakdown(!args.raw_counts).await?;

    render_nationality(&entries);

    if let Some(path) = args.csv {
        export_csv(&path, &entries)?;
    }
    Ok(())
}

pub(crate) async fn run_ages_report(args: AgesArgs) -> Result<(), AppError> {
    let service = connect_service().await?;
    let distribution = service.age_distribution().await?;

    render_age_distribution(&distribution);

    if let Some(path) = args.csv {
        export_csv(&path, &distribution.buckets)?;
    }
    Ok(())
}

pub(crate) async fn run_education_report(args: EducationArgs) -> Result<(), AppError> {
    let service = connect_service().await?;
    let entries = service.education_breakdown(args.normalize).await?;

    render_education(&entries);

    if let Some(path) = args.csv {
        export_csv(&path, &entries)?;
    }
    Ok(())
}

pub(crate) async fn run_no_quiz_report(args: NoQuizArgs) -> Result<(), AppError> {
    let service = connect_service().await?;
    let entries = service.no_quiz_per_day().await?;

    render_no_quiz(&entries);

    if let Some(path) = args.csv {
        export_csv(&path, &entries)?;
    }
    Ok(())
}

pub(crate) async fn run_contingency_report(args: ContingencyArgs) -> Result<(), AppError> {
    let service = connect_service().await?;
    let table = service.contingency_table().await?;

    render_contingency(&table);

    if let Some(path) = args.csv {
        export_csv(&path, &table.rows)?;
    }
    Ok(())
}

fn render_nationality(entries: &[NationalityEntry]) {
    println!("Applicant nationality ({} countries)", entries.len());
    for entry in entries {
        let name = entry.country_name.unwrap_or("(unknown)");
        let iso3 = entry.country_iso3.unwrap_or("-");
        match entry.count_pct {
            Some(pct) => println!(
                "- {} [{}/{}]: {} ({:.2}%)",
                name, entry.country_iso2, iso3, entry.count, pct
            ),
            None => println!("- {} [{}/{}]: {}", name, entry.country_iso2, iso3, entry.count),
        }
    }
}

fn render_age_distribution(distribution: &AgeDistribution) {
    println!("Applicant ages ({} applicants)", distribution.count);
    if let (Some(min), Some(max), Some(mean)) =
        (distribution.min, distribution.max, distribution.mean)
    {
        println!("Range {min}-{max}, mean {mean:.1}");
    }

    if distribution.buckets.is_empty() {
        println!("No ages recorded");
        return;
    }

    println!("\nAge buckets");
    for bucket in &distribution.buckets {
        println!("- {}-{}: {}", bucket.lower, bucket.upper, bucket.count);
    }
}

fn render_education(entries: &[EducationEntry]) {
    println!("Applicant education levels");
    for entry in entries {
        match entry.count_pct {
            Some(pct) => println!("- {}: {} ({:.2}%)", entry.level_label, entry.count, pct),
            None => println!("- {}: {}", entry.level_label, entry.count),
        }
    }
}

fn render_no_quiz(entries: &[DailyNoQuizEntry]) {
    if entries.is_empty() {
        println!("Quiz-incomplete applicants per day: none");
        return;
    }

    println!("Quiz-incomplete applicants per day");
    for entry in entries {
        println!("- {}: {}", entry.day, entry.count);
    }
}

fn render_contingency(table: &ContingencyTable) {
    println!("Experiment group by quiz completion");
    for row in &table.rows {
        println!(
            "- {}: {} complete, {} incomplete ({} total)",
            row.group_label, row.complete, row.incomplete, row.total
        );
    }

    let totals = table.column_totals();
    println!(
        "- all groups: {} complete, {} incomplete ({} total)",
        totals.complete,
        totals.incomplete,
        table.grand_total()
    );
}

fn export_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}
