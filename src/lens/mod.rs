//! Lens module
//!
//! This module provides high-level "lens" abstractions that combine the
//! migration engine with output formatting. Lenses are what the CLI talks
//! to; applications embedding caribou can use them too, or go straight to
//! [`crate::migration`].
//!
//! # Architecture
//!
//! Each lens module exports:
//! - A **Lens struct** (e.g., `MigrateLens`) - the main entry point for all operations
//! - **Output types** - return types rendered as tables or JSON
//!
//! # Usage
//!
//! ```rust,ignore
//! use caribou::lens::migrate::{MigrateLens, MigrationEntry};
//! use caribou::lens::utils::OutputFormat;
//! ```

pub mod utils;

// MigrateLens - version status, upgrade, downgrade, listing
pub mod migrate;
