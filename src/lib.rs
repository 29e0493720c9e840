// Library exports for Yatube
// This allows integration tests and the binary to share the site modules

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod pagination;
pub mod routes;
pub mod state;
pub mod uploads;
