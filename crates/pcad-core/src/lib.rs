//! Parametric Document Engine
//!
//! This crate provides:
//! - The document root holding part studios and parameters
//! - Snapshot-based undo/redo history
//! - The editing session that records every committed edit
//! - Engine configuration
//! - Document file serialization

pub mod config;
pub mod document;
pub mod history;
pub mod project;
pub mod session;

// Re-exports for convenience
pub use config::{ConfigError, DEFAULT_LOG_FILTER, EngineConfig};
pub use document::{DEFAULT_PART_STUDIO_NAME, Document};
pub use history::History;
pub use project::{FORMAT_VERSION, ProjectError, from_bytes, to_bytes};
pub use session::{Session, SessionError, SessionResult};
