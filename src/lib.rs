pub mod aggregate;
pub mod api;
pub mod app_error;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod storage;
pub mod tabular;
pub mod transform;
pub mod warehouse;
