use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ArrayError;
use crate::variable::Variable;

/// Insertion-ordered name -> variable namespace (coords or attrs).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Coords {
    items: IndexMap<String, Variable>,
}

impl Coords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.items.get(name)
    }

    pub fn get_required(&self, name: &str) -> Result<&Variable, ArrayError> {
        self.items
            .get(name)
            .ok_or_else(|| ArrayError::KeyNotFound(name.to_string()))
    }

    /// Insert, returning the previous value under `name` if any.
    pub fn insert(&mut self, name: &str, var: Variable) -> Option<Variable> {
        self.items.insert(name.to_string(), var)
    }

    /// Remove and return `name`, preserving the order of the remaining items.
    pub fn pop(&mut self, name: &str) -> Option<Variable> {
        self.items.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Variable)> {
        self.items.iter_mut()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn deep_copy(&self) -> Self {
        Self {
            items: self
                .items
                .iter()
                .map(|(name, var)| (name.clone(), var.deep_copy()))
                .collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, Variable)> for Coords {
    fn from_iter<T: IntoIterator<Item = (S, Variable)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_preserves_order() {
        let mut coords: Coords = [
            ("a", Variable::scalar(1.0)),
            ("b", Variable::scalar(2.0)),
            ("c", Variable::scalar(3.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(coords.pop("b"), Some(Variable::scalar(2.0)));
        assert_eq!(coords.pop("b"), None);
        assert_eq!(coords.names(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_get_required() {
        let coords = Coords::new();
        assert_eq!(
            coords.get_required("x").unwrap_err(),
            ArrayError::KeyNotFound("x".to_string())
        );
    }
}
