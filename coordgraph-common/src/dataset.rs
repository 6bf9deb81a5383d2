use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data_array::DataArray;
use crate::error::ArrayError;

/// An insertion-ordered, named collection of data arrays.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Dataset {
    items: IndexMap<String, DataArray>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, item: DataArray) -> Option<DataArray> {
        self.items.insert(name.to_string(), item)
    }

    pub fn get(&self, name: &str) -> Result<&DataArray, ArrayError> {
        self.items
            .get(name)
            .ok_or_else(|| ArrayError::KeyNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataArray)> {
        self.items.iter()
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
}

impl<S: Into<String>> FromIterator<(S, DataArray)> for Dataset {
    fn from_iter<T: IntoIterator<Item = (S, DataArray)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn test_dataset_serializes_by_item_name() {
        let ds: Dataset = [(
            "sample",
            DataArray::new("sample", Variable::from_vec("x", vec![1.0, 2.0]))
                .with_coord("x", Variable::from_vec("x", vec![0.5, 1.5]).with_unit("m"))
                .unwrap(),
        )]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&ds).unwrap();
        assert!(json.get("sample").is_some());
        assert_eq!(json["sample"]["coords"]["x"]["unit"], "m");

        let back: Dataset = serde_json::from_value(json).unwrap();
        assert_eq!(back, ds);
    }
}
