//! Shared test doubles for engine tests.

pub mod metadata_stub;

pub use metadata_stub::StubMetadataSource;
