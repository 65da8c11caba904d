pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod observability;
pub mod state;
pub mod store;
