//! Charpick engine library.
//!
//! Selection and roster-cache synchronization for the character picking game.
//!
//! ## Structure
//!
//! - `use_cases/` - Selection engine: queries, mutations, identity-driven loading
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Shared test doubles.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
