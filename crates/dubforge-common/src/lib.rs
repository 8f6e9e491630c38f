//! Dubforge-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across dubforge:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for jobs
//! - **Core Types**: Enums for processing modes and language tags
//! - **Path Utilities**: File-type detection and media-root containment
//! - **Error Handling**: The unified error type and result alias

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
