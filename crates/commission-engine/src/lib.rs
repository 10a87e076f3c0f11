pub mod commission;
pub mod config;
pub mod error;
pub mod telemetry;
