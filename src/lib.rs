//! Library exports for the rule catalogue
//!
//! The server (`src/main.rs`) and the `seed` binary are thin wrappers over
//! these modules; integration tests use them directly.

pub mod config;
pub mod data;
pub mod database;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod route;
pub mod seed;
pub mod stats;
pub mod text;
