use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::Instrument;

use crate::error::AppError;
use crate::telemetry::report_span;

use super::repository::ApplicantRepository;
use super::service::ApplicantReportService;
use super::views::{
    AgeDistribution, ContingencyTable, DailyNoQuizEntry, EducationEntry, NationalityEntry,
};

/// Router builder exposing the report tables read-only.
pub fn report_router<R>(service: Arc<ApplicantReportService<R>>) -> Router
where
    R: ApplicantRepository + 'static,
{
    Router::new()
        .route("/api/v1/reports/nationality", get(nationality_handler::<R>))
        .route("/api/v1/reports/ages", get(ages_handler::<R>))
        .route(
            "/api/v1/reports/age-distribution",
            get(age_distribution_handler::<R>),
        )
        .route("/api/v1/reports/education", get(education_handler::<R>))
        .route(
            "/api/v1/reports/no-quiz-per-day",
            get(no_quiz_handler::<R>),
        )
        .route(
            "/api/v1/reports/contingency-table",
            get(contingency_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct NormalizeQuery {
    normalize: Option<bool>,
}

pub(crate) async fn nationality_handler<R>(
    State(service): State<Arc<ApplicantReportService<R>>>,
    Query(params): Query<NormalizeQuery>,
) -> Result<Json<Vec<NationalityEntry>>, AppError>
where
    R: ApplicantRepository + 'static,
{
    let normalize = params.normalize.unwrap_or(true);
    let entries = service
        .nationality_breakdown(normalize)
        .instrument(report_span("nationality"))
        .await?;
    Ok(Json(entries))
}

pub(crate) async fn ages_handler<R>(
    State(service): State<Arc<ApplicantReportService<R>>>,
) -> Result<Json<Vec<i64>>, AppError>
where
    R: ApplicantRepository + 'static,
{
    let ages = service.ages().instrument(report_span("ages")).await?;
    Ok(Json(ages))
}

pub(crate) async fn age_distribution_handler<R>(
    State(service): State<Arc<ApplicantReportService<R>>>,
) -> Result<Json<AgeDistribution>, AppError>
where
    R: ApplicantRepository + 'static,
{
    let distribution = service
        .age_distribution()
        .instrument(report_span("age-distribution"))
        .await?;
    Ok(Json(distribution))
}

pub(crate) async fn education_handler<R>(
    State(service): State<Arc<ApplicantReportService<R>>>,
    Query(params): Query<NormalizeQuery>,
) -> Result<Json<Vec<EducationEntry>>, AppError>
where
    R: ApplicantRepository + 'static,
{
    let normalize = params.normalize.unwrap_or(false);
    let entries = service
        .education_breakdown(normalize)
        .instrument(report_span("education"))
        .await?;
    Ok(Json(entries))
}

pub(crate) async fn no_quiz_handler<R>(
    State(service): State<Arc<ApplicantReportService<R>>>,
) -> Result<Json<Vec<DailyNoQuizEntry>>, AppError>
where
    R: ApplicantRepository + 'static,
{
    let entries = service
        .no_quiz_per_day()
        .instrument(report_span("no-quiz-per-day"))
        .await?;
    Ok(Json(entries))
}

pub(crate) async fn contingency_handler<R>(
    State(service): State<Arc<ApplicantReportService<R>>>,
) -> Result<Json<ContingencyTable>, AppError>
where
    R: ApplicantRepository + 'static,
{
    let table = service
        .contingency_table()
        .instrument(report_span("contingency-table"))
        .await?;
    Ok(Json(table))
}
