use serde::{Deserialize, Serialize};

/// Flags controlling what a transformation keeps and how it runs.
///
/// Missing fields take their defaults when deserialized, so a partial
/// JSON or TOML table is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Rename a dimension to the single coordinate computed from it
    pub rename_dims: bool,
    /// Keep coordinates that are plain aliases of other coordinates
    pub include_aliases: bool,
    /// Keep consumed names that the transformation itself produced
    pub keep_intermediate: bool,
    /// Keep consumed names that were present in the input
    pub keep_inputs: bool,
    /// Fail instead of warn if the dense and event pass disagree
    pub check_consistency: bool,
    /// Transform dataset items on the rayon thread pool. Every item runs
    /// to completion; errors are reported in dataset order.
    pub parallel: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            rename_dims: true,
            include_aliases: true,
            keep_intermediate: true,
            keep_inputs: true,
            check_consistency: false,
            parallel: false,
        }
    }
}

impl TransformOptions {
    pub fn with_rename_dims(mut self, rename_dims: bool) -> Self {
        self.rename_dims = rename_dims;
        self
    }

    pub fn with_include_aliases(mut self, include_aliases: bool) -> Self {
        self.include_aliases = include_aliases;
        self
    }

    pub fn with_keep_intermediate(mut self, keep_intermediate: bool) -> Self {
        self.keep_intermediate = keep_intermediate;
        self
    }

    pub fn with_keep_inputs(mut self, keep_inputs: bool) -> Self {
        self.keep_inputs = keep_inputs;
        self
    }

    pub fn with_check_consistency(mut self, check_consistency: bool) -> Self {
        self.check_consistency = check_consistency;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Keep only the requested outputs and the original coordinates.
    pub fn minimal() -> Self {
        Self::default()
            .with_include_aliases(false)
            .with_keep_intermediate(false)
            .with_keep_inputs(false)
    }
}
