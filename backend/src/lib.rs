pub mod activity;
pub mod api;
pub mod config;
pub mod market;
pub mod metrics;
pub mod persistence;
pub mod scheduler;

pub mod error;
pub mod logger;
pub mod time;
