//! # Fluency Common Library
//!
//! Shared code for the fluency scoring workspace:
//! - Configuration loading (TOML bootstrap + compiled defaults)
//! - Sample index reading and score output writing
//! - Common error types

pub mod config;
pub mod dataset;
pub mod error;

pub use error::{Error, Result};
