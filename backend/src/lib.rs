pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod push;
pub mod scheduler;
pub mod services;
pub mod sources;
pub mod utils;
