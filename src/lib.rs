pub mod api;
pub mod client;
pub mod config;
pub mod contract;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
