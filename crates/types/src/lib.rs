//! Catnav Types - document model shared by the content store and its callers
//!
//! The navigation document is the payload persisted in the tracked data file:
//! an ordered list of categories, each holding an ordered list of sites, plus
//! a page title and an optional default search engine.

mod navigation;

pub use navigation::{Category, FILE_SHA_FIELD, NavigationDocument, Site};
