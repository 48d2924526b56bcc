//! Poster publishing.
//!
//! This crate provides:
//! - The [`StoragePublisher`] contract (`upload(bytes, key, options) -> public URL`)
//! - A Cloudflare R2 implementation
//! - An in-memory implementation for dry runs
//! - The object key layout for poster bundles

pub mod client;
pub mod error;
pub mod keys;
pub mod publisher;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use keys::{bundle_prefix, rendition_key, sanitize_segment, upload_options};
pub use publisher::{MemoryPublisher, StoragePublisher, StoredObject, UploadOptions};
