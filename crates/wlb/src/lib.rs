//! Work-life-balance prediction and scoring for employee survey data.
//!
//! - [`table`] reads and writes loosely typed CSV data.
//! - [`model`] holds trained predictors and their JSON artifacts.
//! - [`training`] fits a random forest artifact from labeled data.
//! - [`scoring`] aligns records, composes the 0-100 WLB score, and buckets it.
//! - [`batch`] scores a CSV file end to end.
//! - [`serving`] exposes the wellbeing model over HTTP.

pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod scoring;
pub mod serving;
pub mod table;
pub mod telemetry;
pub mod training;
