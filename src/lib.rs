// Library for tests to access modules

pub mod alert_feed;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod history;
pub mod merge;
pub mod models;
pub mod notify;
pub mod poller;
pub mod routes;
pub mod telemetry_repo;
pub mod topology;
pub mod version;
