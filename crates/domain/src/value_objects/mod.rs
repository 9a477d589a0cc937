//! Value objects.

pub mod selection_document;

pub use selection_document::{
    SelectionDocument, CACHED_ANIMES_DATA_FIELD, SELECTED_CHARACTER_IDS_FIELD,
};
