//! Storage layer
//!
//! ## Architecture
//!
//! - **Backend**: a flat string namespace ([`KeyValueStore`]), backed by
//!   files on disk or by memory
//! - **Records**: typed collections, each a JSON array under one key
//!
//! Collections are read in full and rewritten in full on every mutation.

pub mod backend;
pub mod error;
pub mod records;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use error::{StorageError, StorageResult};
pub use records::{Collection, Record, RecordStore};
