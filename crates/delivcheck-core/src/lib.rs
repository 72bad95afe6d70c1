//! Core contracts and helpers for delivcheck.
//!
//! This crate defines the archive abstraction, the deliverable record, and
//! utilities shared across the rule, evaluation and CLI crates.

pub mod archive;
pub mod deliverable;
pub mod error;
pub mod format;

pub use archive::{Archive, ArchiveEntry, MemoryArchive, ZipBundle};
pub use deliverable::Deliverable;
pub use error::{Error, Result};
pub use format::{format_bytes, truncate_preview};

/// Current contract version for `catalog.json` documents.
pub const CATALOG_VERSION: &str = "0.1";
