use coordgraph_common::{DataArray, Dataset};
use rayon::prelude::*;
use tracing::{debug, info_span};

use crate::error::Result;
use crate::graph::Graph;
use crate::options::TransformOptions;
use crate::transform::CoordTransform;

/// Names of the coordinates to compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets(Vec<String>);

impl Targets {
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Targets {
    fn from(name: &str) -> Self {
        Targets(vec![name.to_string()])
    }
}

impl From<String> for Targets {
    fn from(name: String) -> Self {
        Targets(vec![name])
    }
}

impl From<Vec<String>> for Targets {
    fn from(names: Vec<String>) -> Self {
        Targets(names)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(names: Vec<&str>) -> Self {
        Targets(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Targets {
    fn from(names: &[&str]) -> Self {
        Targets(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(names: [&str; N]) -> Self {
        Targets(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Containers [`transform_coords`] accepts. The result has the same kind
/// as the input.
pub trait Transformable: Sized {
    fn transform(&self, targets: &[String], graph: &Graph, options: &TransformOptions) -> Result<Self>;
}

impl Transformable for DataArray {
    fn transform(&self, targets: &[String], graph: &Graph, options: &TransformOptions) -> Result<Self> {
        CoordTransform::new(self, graph, targets, options).finalize()
    }
}

impl Transformable for Dataset {
    /// Each item is transformed independently. Intermediate results are
    /// never shared between items. On failure the error of the first
    /// failing item, in dataset order, is returned.
    fn transform(&self, targets: &[String], graph: &Graph, options: &TransformOptions) -> Result<Self> {
        let run = |(name, item): (&String, &DataArray)| {
            info_span!("transform_item", item = name.as_str())
                .in_scope(|| item.transform(targets, graph, options))
                .map(|out| (name.clone(), out))
        };

        let items: Vec<(&String, &DataArray)> = self.iter().collect();
        if !options.parallel {
            return items.into_iter().map(run).collect();
        }
        // Collected in item order; the first error in that order is returned.
        let results: Vec<Result<(String, DataArray)>> = items.into_par_iter().map(run).collect();
        results.into_iter().collect()
    }
}

/// Compute the coordinates named by `targets` on `x` using `graph`.
///
/// The input is never modified. The result is a new array (or dataset)
/// sharing unchanged value buffers with `x`.
#[tracing::instrument(skip_all)]
pub fn transform_coords<T: Transformable>(
    x: &T,
    targets: impl Into<Targets>,
    graph: &Graph,
    options: &TransformOptions,
) -> Result<T> {
    let targets = targets.into();
    debug!(targets = ?targets.names(), ?options, "transforming coordinates");
    x.transform(targets.names(), graph, options)
}
