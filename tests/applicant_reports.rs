//! Integration specifications for the applicant report tables.
//!
//! Scenarios exercise the reshaping service and the HTTP router through the
//! public facade over an in-memory repository, so every table can be
//! validated without a running database.

mod common {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use applicant_insights::reports::repository::{
        ApplicantRepository, DailyCount, EducationCount, ExperimentObservation, NationalityCount,
        RepositoryError,
    };
    use applicant_insights::reports::ApplicantReportService;

    /// In-memory stand-in returning canned rows for every query shape.
    #[derive(Default, Clone)]
    pub(super) struct Repository {
        pub(super) nationalities: Vec<NationalityCount>,
        pub(super) ages: Vec<i64>,
        pub(super) education: Vec<EducationCount>,
        pub(super) daily: Vec<DailyCount>,
        pub(super) observations: Vec<ExperimentObservation>,
    }

    #[async_trait]
    impl ApplicantRepository for Repository {
        async fn nationality_counts(&self) -> Result<Vec<NationalityCount>, RepositoryError> {
            Ok(self.nationalities.clone())
        }

        async fn ages(&self) -> Result<Vec<i64>, RepositoryError> {
            Ok(self.ages.clone())
        }

        async fn education_counts(&self) -> Result<Vec<EducationCount>, RepositoryError> {
            Ok(self.education.clone())
        }

        async fn no_quiz_daily_counts(&self) -> Result<Vec<DailyCount>, RepositoryError> {
            Ok(self.daily.clone())
        }

        async fn experiment_observations(
            &self,
        ) -> Result<Vec<ExperimentObservation>, RepositoryError> {
            Ok(self.observations.clone())
        }
    }

    pub(super) fn build_service(repository: Repository) -> ApplicantReportService<Repository> {
        ApplicantReportService::new(Arc::new(repository))
    }

    pub(super) fn nationality_row(iso2: &str, count: i64) -> NationalityCount {
        NationalityCount {
            country_iso2: iso2.to_string(),
            count,
        }
    }

    pub(super) fn education_row(level: &str, count: i64) -> EducationCount {
        EducationCount {
            level: level.to_string(),
            count,
        }
    }

    pub(super) fn daily_row(year: i32, month: u32, day: u32, count: i64) -> DailyCount {
        let midnight = NaiveDate::from_ymd_opt(year, month, day)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
            .and_utc();
        DailyCount {
            day: mongodb::bson::DateTime::from_millis(midnight.timestamp_millis()),
            count,
        }
    }

    pub(super) fn observation(group: &str, quiz: &str) -> ExperimentObservation {
        ExperimentObservation {
            group: group.to_string(),
            admissions_quiz: quiz.to_string(),
        }
    }
}

mod nationality {
    use super::common::*;

    #[tokio::test]
    async fn rows_sort_by_count_with_iso2_tie_break() {
        let service = build_service(Repository {
            nationalities: vec![
                nationality_row("US", 30),
                nationality_row("DE", 4),
                nationality_row("BR", 4),
            ],
            ..Repository::default()
        });

        let entries = service
            .nationality_breakdown(false)
            .await
            .expect("breakdown builds");

        let order: Vec<&str> = entries
            .iter()
            .map(|entry| entry.country_iso2.as_str())
            .collect();
        assert_eq!(order, ["BR", "DE", "US"]);
        assert!(entries.iter().all(|entry| entry.count_pct.is_none()));
    }

    #[tokio::test]
    async fn country_join_fills_name_and_iso3() {
        let service = build_service(Repository {
            nationalities: vec![nationality_row("ng", 12)],
            ..Repository::default()
        });

        let entries = service
            .nationality_breakdown(false)
            .await
            .expect("breakdown builds");

        assert_eq!(entries[0].country_name, Some("Nigeria"));
        assert_eq!(entries[0].country_iso3, Some("NGA"));
    }

    #[tokio::test]
    async fn unknown_code_keeps_row_with_empty_columns() {
        let service = build_service(Repository {
            nationalities: vec![nationality_row("XX", 2), nationality_row("IN", 9)],
            ..Repository::default()
        });

        let entries = service
            .nationality_breakdown(true)
            .await
            .expect("breakdown builds");

        let unknown = entries
            .iter()
            .find(|entry| entry.country_iso2 == "XX")
            .expect("row kept");
        assert_eq!(unknown.country_name, None);
        assert_eq!(unknown.country_iso3, None);
        assert!(unknown.count_pct.is_some());
    }

    #[tokio::test]
    async fn normalized_percentages_sum_to_one_hundred() {
        let service = build_service(Repository {
            nationalities: vec![
                nationality_row("US", 25),
                nationality_row("IN", 50),
                nationality_row("NG", 25),
            ],
            ..Repository::default()
        });

        let entries = service
            .nationality_breakdown(true)
            .await
            .expect("breakdown builds");

        let total: f64 = entries
            .iter()
            .map(|entry| entry.count_pct.expect("pct present"))
            .sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(entries.last().expect("rows present").count, 50);
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_table() {
        let service = build_service(Repository::default());
        let entries = service
            .nationality_breakdown(true)
            .await
            .expect("breakdown builds");
        assert!(entries.is_empty());
    }
}

mod education {
    use super::common::*;
    use applicant_insights::reports::{EducationLevel, ReportError};

    #[tokio::test]
    async fn rows_follow_fixed_attainment_order() {
        let service = build_service(Repository {
            education: vec![
                education_row("Doctorate (e.g. PhD)", 5),
                education_row("High School or Baccalaureate", 40),
                education_row("Master's degree", 11),
            ],
            ..Repository::default()
        });

        let entries = service
            .education_breakdown(false)
            .await
            .expect("breakdown builds");

        let levels: Vec<EducationLevel> = entries.iter().map(|entry| entry.level).collect();
        assert_eq!(
            levels,
            [
                EducationLevel::HighSchool,
                EducationLevel::Masters,
                EducationLevel::Doctorate,
            ]
        );
        assert_eq!(entries[0].count, 40);
    }

    #[tokio::test]
    async fn normalize_adds_percentages_without_reordering() {
        let service = build_service(Repository {
            education: vec![
                education_row("Bachelor's degree", 30),
                education_row("Some College (1-3 years)", 10),
            ],
            ..Repository::default()
        });

        let entries = service
            .education_breakdown(true)
            .await
            .expect("breakdown builds");

        assert_eq!(entries[0].level, EducationLevel::SomeCollege);
        assert_eq!(entries[0].count_pct, Some(25.0));
        assert_eq!(entries[1].count_pct, Some(75.0));
    }

    #[tokio::test]
    async fn unknown_label_is_an_error() {
        let service = build_service(Repository {
            education: vec![education_row("Trade school", 3)],
            ..Repository::default()
        });

        let err = service
            .education_breakdown(false)
            .await
            .expect_err("unknown label rejected");
        assert!(matches!(err, ReportError::UnknownEducationLevel(label) if label == "Trade school"));
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_table() {
        let service = build_service(Repository::default());
        let entries = service
            .education_breakdown(true)
            .await
            .expect("breakdown builds");
        assert!(entries.is_empty());
    }
}

mod ages {
    use super::common::*;

    #[tokio::test]
    async fn raw_ages_pass_through_unchanged() {
        let service = build_service(Repository {
            ages: vec![33, 21, 45, 21],
            ..Repository::default()
        });

        let ages = service.ages().await.expect("ages load");
        assert_eq!(ages, [33, 21, 45, 21]);
    }

    #[tokio::test]
    async fn distribution_reports_buckets_and_statistics() {
        let service = build_service(Repository {
            ages: vec![22, 23, 27, 41],
            ..Repository::default()
        });

        let distribution = service.age_distribution().await.expect("distribution builds");

        assert_eq!(distribution.count, 4);
        assert_eq!(distribution.min, Some(22));
        assert_eq!(distribution.max, Some(41));
        assert_eq!(distribution.mean, Some(28.25));

        let first = &distribution.buckets[0];
        assert_eq!((first.lower, first.upper, first.count), (20, 24, 2));
        let last = distribution.buckets.last().expect("buckets present");
        assert_eq!((last.lower, last.upper, last.count), (40, 44, 1));
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_distribution() {
        let service = build_service(Repository::default());
        let distribution = service.age_distribution().await.expect("distribution builds");
        assert_eq!(distribution.count, 0);
        assert!(distribution.buckets.is_empty());
        assert!(distribution.min.is_none());
    }
}

mod no_quiz {
    use super::common::*;
    use applicant_insights::reports::repository::DailyCount;
    use applicant_insights::reports::ReportError;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn days_come_back_sorted_ascending() {
        let service = build_service(Repository {
            daily: vec![
                daily_row(2025, 5, 6, 17),
                daily_row(2025, 5, 4, 40),
                daily_row(2025, 5, 5, 32),
            ],
            ..Repository::default()
        });

        let entries = service.no_quiz_per_day().await.expect("report builds");

        let days: Vec<NaiveDate> = entries.iter().map(|entry| entry.day).collect();
        assert_eq!(
            days,
            [
                NaiveDate::from_ymd_opt(2025, 5, 4).expect("valid date"),
                NaiveDate::from_ymd_opt(2025, 5, 5).expect("valid date"),
                NaiveDate::from_ymd_opt(2025, 5, 6).expect("valid date"),
            ]
        );
        assert_eq!(entries[0].count, 40);
    }

    #[tokio::test]
    async fn empty_collection_yields_no_days() {
        let service = build_service(Repository::default());
        let entries = service.no_quiz_per_day().await.expect("report builds");
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_day_timestamp_is_an_error() {
        let service = build_service(Repository {
            daily: vec![DailyCount {
                day: mongodb::bson::DateTime::from_millis(i64::MAX),
                count: 1,
            }],
            ..Repository::default()
        });

        let err = service
            .no_quiz_per_day()
            .await
            .expect_err("unrepresentable day rejected");
        assert!(matches!(err, ReportError::UnrepresentableDay(_)));
    }
}

mod contingency {
    use super::common::*;
    use applicant_insights::reports::{ExperimentGroup, ReportError};

    #[tokio::test]
    async fn crosstab_tallies_groups_by_completion() {
        let service = build_service(Repository {
            observations: vec![
                observation("no email (control)", "complete"),
                observation("no email (control)", "incomplete"),
                observation("no email (control)", "incomplete"),
                observation("email (treatment)", "complete"),
                observation("email (treatment)", "complete"),
            ],
            ..Repository::default()
        });

        let table = service.contingency_table().await.expect("table builds");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].group, ExperimentGroup::Control);
        assert_eq!(table.rows[0].complete, 1);
        assert_eq!(table.rows[0].incomplete, 2);
        assert_eq!(table.rows[1].group, ExperimentGroup::Treatment);
        assert_eq!(table.rows[1].complete, 2);
        assert_eq!(table.rows[1].incomplete, 0);

        let totals = table.column_totals();
        assert_eq!(totals.complete, 3);
        assert_eq!(totals.incomplete, 2);
        assert_eq!(table.grand_total(), 5);
    }

    #[tokio::test]
    async fn empty_experiment_yields_zeroed_rows() {
        let service = build_service(Repository::default());
        let table = service.contingency_table().await.expect("table builds");
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|row| row.total == 0));
        assert_eq!(table.grand_total(), 0);
    }

    #[tokio::test]
    async fn unknown_group_label_is_an_error() {
        let service = build_service(Repository {
            observations: vec![observation("placebo", "complete")],
            ..Repository::default()
        });

        let err = service
            .contingency_table()
            .await
            .expect_err("unknown group rejected");
        assert!(matches!(err, ReportError::UnknownExperimentGroup(label) if label == "placebo"));
    }

    #[tokio::test]
    async fn unknown_quiz_label_is_an_error() {
        let service = build_service(Repository {
            observations: vec![observation("email (treatment)", "partial")],
            ..Repository::default()
        });

        let err = service
            .contingency_table()
            .await
            .expect_err("unknown status rejected");
        assert!(matches!(err, ReportError::UnknownQuizStatus(label) if label == "partial"));
    }
}

mod routing {
    use super::common::*;
    use applicant_insights::reports::report_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn build_router(repository: Repository) -> axum::Router {
        let service = Arc::new(
            applicant_insights::reports::ApplicantReportService::new(Arc::new(repository)),
        );
        report_router(service)
    }

    async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        (status, payload)
    }

    #[tokio::test]
    async fn nationality_normalizes_by_default() {
        let router = build_router(Repository {
            nationalities: vec![nationality_row("US", 3), nationality_row("IN", 1)],
            ..Repository::default()
        });

        let (status, payload) = get_json(router, "/api/v1/reports/nationality").await;

        assert_eq!(status, StatusCode::OK);
        let rows = payload.as_array().expect("array body");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("country_iso2").and_then(Value::as_str),
            Some("IN")
        );
        assert_eq!(rows[0].get("count_pct").and_then(Value::as_f64), Some(25.0));
    }

    #[tokio::test]
    async fn nationality_honors_normalize_false() {
        let router = build_router(Repository {
            nationalities: vec![nationality_row("US", 3)],
            ..Repository::default()
        });

        let (status, payload) =
            get_json(router, "/api/v1/reports/nationality?normalize=false").await;

        assert_eq!(status, StatusCode::OK);
        let rows = payload.as_array().expect("array body");
        assert!(rows[0].get("count_pct").is_none());
    }

    #[tokio::test]
    async fn education_defaults_to_raw_counts() {
        let router = build_router(Repository {
            education: vec![education_row("Bachelor's degree", 8)],
            ..Repository::default()
        });

        let (status, payload) = get_json(router, "/api/v1/reports/education").await;

        assert_eq!(status, StatusCode::OK);
        let rows = payload.as_array().expect("array body");
        assert_eq!(
            rows[0].get("level_label").and_then(Value::as_str),
            Some("Bachelor's degree")
        );
        assert!(rows[0].get("count_pct").is_none());
    }

    #[tokio::test]
    async fn age_distribution_returns_buckets() {
        let router = build_router(Repository {
            ages: vec![20, 21, 39],
            ..Repository::default()
        });

        let (status, payload) = get_json(router, "/api/v1/reports/age-distribution").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("count").and_then(Value::as_u64), Some(3));
        let buckets = payload
            .get("buckets")
            .and_then(Value::as_array)
            .expect("buckets");
        assert_eq!(buckets.len(), 4);
    }

    #[tokio::test]
    async fn contingency_table_serializes_both_rows() {
        let router = build_router(Repository {
            observations: vec![observation("no email (control)", "incomplete")],
            ..Repository::default()
        });

        let (status, payload) = get_json(router, "/api/v1/reports/contingency-table").await;

        assert_eq!(status, StatusCode::OK);
        let rows = payload
            .get("rows")
            .and_then(Value::as_array)
            .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("group_label").and_then(Value::as_str),
            Some("no email (control)")
        );
        assert_eq!(rows[0].get("incomplete").and_then(Value::as_u64), Some(1));
    }

    #[tokio::test]
    async fn malformed_applicant_data_maps_to_bad_gateway() {
        let router = build_router(Repository {
            education: vec![education_row("Trade school", 1)],
            ..Repository::default()
        });

        let (status, payload) = get_json(router, "/api/v1/reports/education").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .contains("Trade school"));
    }
}
