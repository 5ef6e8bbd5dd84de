pub mod app;
pub mod auth;
pub mod bills;
pub mod categories;
pub mod config;
pub mod error;
pub mod extract;
pub mod state;
pub mod types;
