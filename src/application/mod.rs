//! Application layer orchestrating the refresh cycle and read queries.
//!
//! `CountryEngine` drives the fetch, reconcile, commit and stamp phases over the
//! ports declared in `domain::ports`; `SummaryCache` rebuilds the summary
//! artifact once a cycle has committed.

pub mod engine;
pub mod summary;
