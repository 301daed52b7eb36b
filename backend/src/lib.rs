pub mod advertisements;
pub mod app;
pub mod auth;
pub mod backup;
pub mod config;
pub mod error;
pub mod handlers;
pub mod listings;
pub mod models;
pub mod requests;
pub mod store;
pub mod uploads;
