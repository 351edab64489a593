pub mod api;
pub mod client;
pub mod config;
pub mod logic;
pub mod models;
pub mod reports;
pub mod repo;
pub mod service;
