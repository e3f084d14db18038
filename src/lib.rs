//! Prometheus exporter for Nordic icebreaker positions from Digitraffic AIS data

pub mod client;
pub mod coerce;
pub mod config;
pub mod errors;
pub mod exporter;
pub mod extract;
pub mod metrics;
pub mod models;
pub mod reconcile;
pub mod server;
pub mod snapshot;
pub mod walker;
