//! Vastrow - virtualized table engine
//!
//! This crate provides the core types for browsing tables far larger than
//! memory or a scrollbar can represent: a bounded scroll mapping over a
//! `u128` row space, and a windowed, cancellable loader for huge delimited
//! files that keeps parsing off the consumer's thread.

pub mod channel;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod csv;
pub mod error;
pub mod events;
pub mod loader;
pub mod scroll;
pub mod source;
pub mod tracing;

// Re-export commonly used types
pub use config::VastrowConfig;
pub use error::{Result, VastrowError};
pub use scroll::{RowId, ScrollGeometry, ScrollScale, TableViewport};
pub use source::{DataSource, FileTableOptions, FileTableSource, Observable, Row, Windowed};
