//! Aggregate roots - domain objects that own their related data
//!
//! Mutations return a [`StateChange`] describing which persisted fields they
//! touched, instead of callers diffing state afterwards.

pub mod selection_state;

pub use selection_state::{AnimeCache, SelectionState, StateChange};
