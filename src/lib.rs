pub mod analytics;
pub mod batch;
pub mod config;
pub mod expr;
pub mod output;
pub mod record;
pub mod scoring;
pub mod survey;
pub mod telemetry;
