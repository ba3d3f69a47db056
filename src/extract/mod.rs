//! Field extraction from listing pages
//!
//! This module turns a fetched item page into raw label/value pairs, a
//! price and a title:
//! - Two-column table rows matched against the label table
//! - A regex fallback over the visible text when no row matches
//! - Digit-only coercion of numeric fields and euro prices

mod fields;
mod numeric;
mod text;

pub use fields::{FieldExtractor, FieldKey, FieldValue, FieldValues, RawFieldMap, Strategy};
pub use numeric::{extract_price, to_int};
pub use text::{page_title, visible_text};
