//! Glue between the command line and the forecasting library.
//!
//! Resolves configuration from file and flags, drives a run behind a progress
//! bar and hands the table to the selected sinks.

pub(crate) mod inspect;
pub(crate) mod run;
pub(crate) mod store_location;
