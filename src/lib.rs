//! Reporting layer over a MongoDB collection of program applicants.
//!
//! The collection stores one document per applicant to a program whose
//! admissions funnel is under an email-nudge experiment. Grouping, counting,
//! and date arithmetic are delegated to the database's aggregation pipeline;
//! this crate reshapes the returned rows into tabular summaries (country
//! joins, a fixed education-level ordering, percentage columns, and the
//! experiment's 2x2 contingency table).

pub mod config;
pub mod error;
pub mod reports;
pub mod telemetry;
