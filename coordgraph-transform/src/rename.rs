use std::collections::HashSet;

use coordgraph_common::DataArray;
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

use crate::error::{Result, TransformError};

/// Input names that fed more than one distinct production step.
pub(crate) fn splitting_nodes(productions: &IndexMap<Vec<String>, Vec<String>>) -> HashSet<String> {
    productions
        .keys()
        .flat_map(|inputs| inputs.iter().unique())
        .counts()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Rename each dimension that was turned into exactly one new coordinate
/// by exactly one production step.
///
/// `productions` maps the input names of every step that ran to the names
/// it produced. A dimension label that fed several steps is left alone.
pub(crate) fn rename_dims(
    obj: &DataArray,
    productions: &IndexMap<Vec<String>, Vec<String>>,
) -> Result<DataArray> {
    let blacklist = splitting_nodes(productions);
    let mut out = obj.clone();

    for (inputs, outputs) in productions {
        let found = inputs
            .iter()
            .filter(|name| out.dims().contains(*name))
            .collect::<Vec<_>>();
        let ([dim], [output]) = (found.as_slice(), outputs.as_slice()) else {
            continue;
        };
        if blacklist.contains(*dim) || *dim == output {
            continue;
        }
        if out.dims().contains(output) {
            return Err(TransformError::CoordCollision(format!(
                "cannot rename dimension `{dim}` to `{output}`: `{output}` is already a dimension"
            )));
        }
        debug!(from = dim.as_str(), to = output.as_str(), "renaming dimension");
        out = out.rename_dims(&[(dim.as_str(), output.as_str())])?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordgraph_common::Variable;

    fn steps(entries: &[(&[&str], &[&str])]) -> IndexMap<Vec<String>, Vec<String>> {
        entries
            .iter()
            .map(|(inputs, outputs)| {
                (
                    inputs.iter().map(|s| s.to_string()).collect(),
                    outputs.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    fn make_array() -> DataArray {
        DataArray::new("a", Variable::from_vec("tof", vec![1.0, 2.0]))
    }

    #[test]
    fn test_splitting_nodes() {
        let productions = steps(&[(&["tof"], &["a"]), (&["tof", "L"], &["b"]), (&["L"], &["c"]), (&["x"], &["d"])]);
        let nodes = splitting_nodes(&productions);
        assert_eq!(nodes, HashSet::from(["tof".to_string(), "L".to_string()]));
    }

    #[test]
    fn test_single_step_renames() {
        let out = rename_dims(&make_array(), &steps(&[(&["tof"], &["time"])])).unwrap();
        assert_eq!(out.dims(), ["time".to_string()]);
    }

    #[test]
    fn test_split_dim_not_renamed() {
        let productions = steps(&[(&["tof"], &["time"]), (&["tof", "L"], &["wavelength"])]);
        let out = rename_dims(&make_array(), &productions).unwrap();
        assert_eq!(out.dims(), ["tof".to_string()]);
    }

    #[test]
    fn test_multi_output_step_not_renamed() {
        let out = rename_dims(&make_array(), &steps(&[(&["tof"], &["a", "b"])])).unwrap();
        assert_eq!(out.dims(), ["tof".to_string()]);
    }

    #[test]
    fn test_chained_renames_follow_production_order() {
        let productions = steps(&[(&["tof"], &["time"]), (&["time"], &["energy"])]);
        let out = rename_dims(&make_array(), &productions).unwrap();
        assert_eq!(out.dims(), ["energy".to_string()]);
    }

    #[test]
    fn test_rename_onto_existing_dim() {
        let obj = DataArray::new(
            "a",
            Variable::from_shape_vec([("x", 1), ("y", 1)], vec![0.0]).unwrap(),
        );
        let err = rename_dims(&obj, &steps(&[(&["x"], &["y"])])).unwrap_err();
        assert!(matches!(err, TransformError::CoordCollision(_)));
    }
}
