//! Use cases - User story orchestration.

pub mod selection;

pub use selection::{SelectionConfig, SelectionEngine, SelectionPorts};
