pub mod aggregate;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod history;
pub mod http_client;
pub mod links;
pub mod logging;
pub mod odds;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod table;
