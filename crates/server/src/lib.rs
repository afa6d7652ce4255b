//! Energy forecasting API server
//!
//! Resolves the serving model once at startup and exposes it over HTTP.

pub mod api;
pub mod config;
pub mod startup;
