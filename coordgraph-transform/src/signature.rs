use std::collections::HashSet;

use crate::error::{Result, TransformError};
use crate::producer::Producer;

/// The validated input names of `producer`.
///
/// Dependency analysis needs an exact, enumerable input set, so entries
/// spelled as variadic parameters (`*args`, `**kwargs`) are rejected, as
/// are empty and repeated names.
pub fn input_names(producer: &dyn Producer) -> Result<Vec<String>> {
    let names = producer.inputs();
    let mut seen = HashSet::new();
    for name in &names {
        if name.starts_with('*') {
            return Err(TransformError::GraphDefinition(format!(
                "{producer:?} declares variadic input `{name}`"
            )));
        }
        if name.trim().is_empty() {
            return Err(TransformError::GraphDefinition(format!(
                "{producer:?} declares an empty input name"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(TransformError::GraphDefinition(format!(
                "{producer:?} declares input `{name}` more than once"
            )));
        }
    }
    Ok(names)
}
