//! Entry index module
//!
//! Collects the documentation entries extracted from every page of a crawl
//! into one deduplicated set and serializes it in a deterministic order:
//! - `Entry` / `EntryType` records
//! - the name comparator shared by entries and types
//! - the page collector holding processed page content

mod entry;
mod entry_index;
mod pages;
mod sort;

pub use entry::{Entry, EntryType};
pub use entry_index::{EntryIndex, IndexSnapshot};
pub use pages::PageDatabase;
pub use sort::{compare_names, sort_by_name};
