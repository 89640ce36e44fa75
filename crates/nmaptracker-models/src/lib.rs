//! Shared entity types and error definitions for the NmapTracker core.
//!
//! This crate contains no I/O — only pure data structures used by every
//! other core crate (parsers, db, merge, analytics, services).

pub mod project;
pub mod scope;
pub mod intent;
pub mod import;
pub mod host;
pub mod port;
pub mod observation;
pub mod baseline;
pub mod error;
