pub mod chart;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod platform;
pub mod replay;
pub mod schedule;
pub mod service;
pub mod stats;
pub mod store;

pub use config::AppConfig;
pub use service::Service;
