//! Markup parsing and structured item extraction
//!
//! - [`extractor`] - container/item/field schema evaluation over an HTML tree
//! - [`transform`] - named value transforms referenced by field definitions

pub mod extractor;
pub mod transform;

pub use extractor::{compile_selector, extract, Extractor};
pub use transform::{TransformFn, TransformRegistry};
