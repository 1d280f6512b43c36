// src/lib.rs
pub mod config;
pub mod database;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod importer;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
