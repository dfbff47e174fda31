//! XML navigation helpers and the record field flattener.

pub mod flatten;
mod utils;

pub use flatten::{flatten, FieldMap, FieldValue, ParsedRecord};
pub use utils::{
    deep_text, element_children, find_child, find_children, get_tag_name, get_text, has_tag,
    local_name,
};
