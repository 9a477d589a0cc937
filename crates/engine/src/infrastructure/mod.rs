//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod document_store;
pub mod identity;
pub mod jikan;
pub mod local_store;
pub mod ports;
pub mod resilient_metadata;
pub mod settings;
