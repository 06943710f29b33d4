//! Access to the remote scheduling service.

pub mod client;
pub mod query;
pub mod worker;

pub use client::{ApiClient, ResourceHistogram};
pub use query::{QueryCell, Resolution};
pub use worker::{ApiEvent, ApiWorker, AssignmentsKey, HistogramKey, LevelingOutcome, ResourcesKey};
