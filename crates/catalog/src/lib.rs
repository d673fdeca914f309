//! Catalog domain module (reusable price-list entries, event-sourced).
//!
//! Saved items are the templates tradespeople pull into quote lines: a name,
//! a category, a default unit price. Pure domain logic, no IO.

pub mod saved_item;

pub use saved_item::{
    ArchiveSavedItem, CreateSavedItem, ItemCategory, SavedItem, SavedItemArchived,
    SavedItemCommand, SavedItemCreated, SavedItemEvent, SavedItemId, SavedItemUpdated,
    UpdateSavedItem,
};
