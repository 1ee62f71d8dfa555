//! # Rates Common Library
//!
//! Shared code for the freight rates service including:
//! - Database initialization and versioned migrations
//! - The region → port code lookup builder
//! - Row models for the raw tables
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
