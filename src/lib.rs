//! Resource timeline and utilization viewer.
//!
//! The [`model`] layer is pure: timeline columns, lanes, utilization and
//! filtering are derived from plain data and tested without a UI. [`api`]
//! talks to the scheduling service off the UI thread, [`state`] turns user
//! intent into state changes and side effects, and [`ui`] renders.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod state;
pub mod ui;

pub use error::{Error, Result};
