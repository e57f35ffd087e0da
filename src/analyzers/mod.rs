//! Aggregation, pivot and statistics engines over enriched traffic records.
//!
//! Every engine is a pure function of an immutable batch: group-by tables,
//! the weekday-by-hour pivot, descriptive statistics and categorical
//! distributions. The [`analyzer`] module runs them together and assembles
//! the [`report::Report`].

pub mod aggregate;
pub mod analyzer;
pub mod describe;
pub mod frequency;
pub mod pivot;
pub mod report;
pub mod types;
pub mod utility;
