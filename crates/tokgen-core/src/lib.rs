pub mod config;
pub mod logging;

pub mod batch;
pub mod control;
pub mod fetch;
pub mod regions;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod store;
