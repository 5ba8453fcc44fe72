//! Reporting operations over the applicant collection.
//!
//! `repository` issues the aggregation pipelines, `service` reshapes the raw
//! rows into the tabular views, and `router` exposes them over HTTP.

pub mod countries;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

pub use domain::{EducationLevel, ExperimentGroup, QuizStatus};
pub use repository::{ApplicantRepository, MongoApplicantRepository, RepositoryError};
pub use router::report_router;
pub use service::{ApplicantReportService, ReportError};
pub use views::{
    AgeBucketEntry, AgeDistribution, ContingencyRow, ContingencyTable, DailyNoQuizEntry,
    EducationEntry, NationalityEntry, QuizOutcomeCounts,
};
