pub mod api;
pub mod app;
pub mod config;
pub mod export;
pub mod models;
pub mod report;
pub mod services;
pub mod session;
pub mod utils;
