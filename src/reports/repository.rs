use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::DatabaseConfig;

/// One nationality group as returned by the database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NationalityCount {
    #[serde(rename = "_id")]
    pub country_iso2: String,
    pub count: i64,
}

/// One education-level group as returned by the database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EducationCount {
    #[serde(rename = "_id")]
    pub level: String,
    pub count: i64,
}

/// One truncated-day group as returned by the database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyCount {
    #[serde(rename = "_id")]
    pub day: mongodb::bson::DateTime,
    pub count: i64,
}

/// Group assignment and quiz outcome of one in-experiment applicant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExperimentObservation {
    pub group: String,
    #[serde(rename = "admissionsQuiz")]
    pub admissions_quiz: String,
}

#[derive(Debug, Deserialize)]
struct AgeRow {
    years: i64,
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("query failed: {0}")]
    Query(#[from] mongodb::error::Error),
    #[error("malformed document from {query} query: {source}")]
    Decode {
        query: &'static str,
        source: mongodb::bson::de::Error,
    },
}

/// Storage abstraction so the reshaping service can be exercised against an
/// in-memory substitute. One method per query shape; rows come back exactly
/// as the database grouped them.
#[async_trait]
pub trait ApplicantRepository: Send + Sync {
    async fn nationality_counts(&self) -> Result<Vec<NationalityCount>, RepositoryError>;
    async fn ages(&self) -> Result<Vec<i64>, RepositoryError>;
    async fn education_counts(&self) -> Result<Vec<EducationCount>, RepositoryError>;
    async fn no_quiz_daily_counts(&self) -> Result<Vec<DailyCount>, RepositoryError>;
    async fn experiment_observations(&self) -> Result<Vec<ExperimentObservation>, RepositoryError>;
}

/// Production repository over one MongoDB collection of applicant documents.
///
/// Grouping, counting, and date arithmetic run inside the database; this
/// type only builds the pipelines and decodes the returned rows. Collection
/// field names live here and nowhere else.
pub struct MongoApplicantRepository {
    collection: Collection<Document>,
}

impl MongoApplicantRepository {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Connect a fresh client and bind to the configured namespace.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let client = Client::with_uri_str(&config.uri).await?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);
        debug!(namespace = %config.namespace(), "bound applicant collection");
        Ok(Self::new(collection))
    }

    async fn run_pipeline<T>(
        &self,
        pipeline: Vec<Document>,
        query: &'static str,
    ) -> Result<Vec<T>, RepositoryError>
    where
        T: DeserializeOwned,
    {
        let documents: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;
        debug!(query, rows = documents.len(), "aggregation returned");
        documents
            .into_iter()
            .map(|document| {
                mongodb::bson::from_document(document)
                    .map_err(|source| RepositoryError::Decode { query, source })
            })
            .collect()
    }
}

#[async_trait]
impl ApplicantRepository for MongoApplicantRepository {
    async fn nationality_counts(&self) -> Result<Vec<NationalityCount>, RepositoryError> {
        let pipeline = vec![doc! {
            "$group": { "_id": "$countryISO2", "count": { "$count": {} } }
        }];
        self.run_pipeline(pipeline, "nationality_counts").await
    }

    async fn ages(&self) -> Result<Vec<i64>, RepositoryError> {
        let pipeline = vec![doc! {
            "$project": {
                "years": {
                    "$dateDiff": {
                        "startDate": "$birthday",
                        "endDate": "$$NOW",
                        "unit": "year",
                    }
                }
            }
        }];
        let rows: Vec<AgeRow> = self.run_pipeline(pipeline, "ages").await?;
        Ok(rows.into_iter().map(|row| row.years).collect())
    }

    async fn education_counts(&self) -> Result<Vec<EducationCount>, RepositoryError> {
        let pipeline = vec![doc! {
            "$group": { "_id": "$highestDegreeEarned", "count": { "$count": {} } }
        }];
        self.run_pipeline(pipeline, "education_counts").await
    }

    async fn no_quiz_daily_counts(&self) -> Result<Vec<DailyCount>, RepositoryError> {
        let pipeline = vec![
            doc! { "$match": { "admissionsQuiz": "incomplete" } },
            doc! {
                "$group": {
                    "_id": { "$dateTrunc": { "date": "$createdAt", "unit": "day" } },
                    "count": { "$count": {} },
                }
            },
        ];
        self.run_pipeline(pipeline, "no_quiz_daily_counts").await
    }

    async fn experiment_observations(&self) -> Result<Vec<ExperimentObservation>, RepositoryError> {
        let documents: Vec<Document> = self
            .collection
            .find(doc! { "inExperiment": true })
            .projection(doc! { "_id": 0, "group": 1, "admissionsQuiz": 1 })
            .await?
            .try_collect()
            .await?;
        documents
            .into_iter()
            .map(|document| {
                mongodb::bson::from_document(document).map_err(|source| RepositoryError::Decode {
                    query: "experiment_observations",
                    source,
                })
            })
            .collect()
    }
}
