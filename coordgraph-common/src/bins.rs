use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::{ArcArray, Array, IxDyn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coords::Coords;
use crate::error::ArrayError;
use crate::variable::Variable;

/// Per outer element, the half-open `[begin, end)` range of its events
/// within the bin buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinIndices {
    dims: Vec<String>,
    ranges: ArcArray<(usize, usize), IxDyn>,
}

impl BinIndices {
    pub fn new<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        ranges: ArcArray<(usize, usize), IxDyn>,
    ) -> Result<Self, ArrayError> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != ranges.ndim() {
            return Err(ArrayError::DimensionMismatch(format!(
                "{} bin dims given for ranges of rank {}",
                dims.len(),
                ranges.ndim()
            )));
        }
        for &(begin, end) in ranges.iter() {
            if begin > end {
                return Err(ArrayError::InvalidBins(format!(
                    "bin begins after it ends: [{begin}, {end})"
                )));
            }
        }
        Ok(Self { dims, ranges })
    }

    /// 1-D bins along `dim` from consecutive bin sizes.
    pub fn from_sizes(dim: &str, sizes: &[usize]) -> Self {
        let mut begin = 0;
        let ranges: Vec<(usize, usize)> = sizes
            .iter()
            .map(|size| {
                let range = (begin, begin + size);
                begin += size;
                range
            })
            .collect();
        Self {
            dims: vec![dim.to_string()],
            ranges: Array::from_vec(ranges).into_dyn().into_shared(),
        }
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.ranges.shape()
    }

    pub fn sizes(&self) -> IndexMap<String, usize> {
        self.dims
            .iter()
            .cloned()
            .zip(self.ranges.shape().iter().copied())
            .collect()
    }

    pub fn ranges(&self) -> &ArcArray<(usize, usize), IxDyn> {
        &self.ranges
    }

    /// One past the largest event index referenced by any bin
    pub fn max_end(&self) -> usize {
        self.ranges.iter().map(|&(_, end)| end).max().unwrap_or(0)
    }

    pub fn rename_dim(&mut self, from: &str, to: &str) {
        for dim in self.dims.iter_mut() {
            if dim == from {
                *dim = to.to_string();
            }
        }
    }
}

/// Flat table of events shared by all bins of a binned array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinBuffer {
    dim: String,
    data: Variable,
    coords: Coords,
    attrs: Coords,
}

impl BinBuffer {
    pub fn new(dim: &str, data: Variable) -> Result<Self, ArrayError> {
        let buffer = Self {
            dim: dim.to_string(),
            data,
            coords: Coords::new(),
            attrs: Coords::new(),
        };
        buffer.check_event_variable("data", &buffer.data)?;
        Ok(buffer)
    }

    pub fn dim(&self) -> &str {
        &self.dim
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &Variable {
        &self.data
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    pub fn coords_mut(&mut self) -> &mut Coords {
        &mut self.coords
    }

    pub fn attrs(&self) -> &Coords {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Coords {
        &mut self.attrs
    }

    pub fn namespaces_mut(&mut self) -> (&mut Coords, &mut Coords) {
        (&mut self.coords, &mut self.attrs)
    }

    pub fn set_coord(&mut self, name: &str, var: Variable) -> Result<Option<Variable>, ArrayError> {
        self.check_event_variable(name, &var)?;
        Ok(self.coords.insert(name, var))
    }

    pub fn set_attr(&mut self, name: &str, var: Variable) -> Result<Option<Variable>, ArrayError> {
        self.check_event_variable(name, &var)?;
        Ok(self.attrs.insert(name, var))
    }

    fn check_event_variable(&self, name: &str, var: &Variable) -> Result<(), ArrayError> {
        if var.dims() != [self.dim.clone()] {
            return Err(ArrayError::DimensionMismatch(format!(
                "event variable `{name}` must be 1-D along `{}`, got [{}]",
                self.dim,
                var.dims().join(", ")
            )));
        }
        if var.len() != self.data.len() {
            return Err(ArrayError::ShapeMismatch {
                expected: vec![self.data.len()],
                actual: vec![var.len()],
            });
        }
        Ok(())
    }

    fn deep_copy(&self) -> Self {
        Self {
            dim: self.dim.clone(),
            data: self.data.deep_copy(),
            coords: self.coords.deep_copy(),
            attrs: self.attrs.deep_copy(),
        }
    }
}

/// Bin structure of a binned data array: outer bin indices plus a shared
/// event buffer.
///
/// Cloning is shallow; the buffer is shared until [`Bins::make_independent`]
/// (or any write through [`Bins::buffer_mut`]) takes a private copy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bins {
    indices: BinIndices,
    buffer: Arc<BinBuffer>,
}

impl Bins {
    pub fn new(indices: BinIndices, buffer: BinBuffer) -> Result<Self, ArrayError> {
        if indices.max_end() > buffer.len() {
            return Err(ArrayError::InvalidBins(format!(
                "bins reference event {} but buffer holds {} events",
                indices.max_end(),
                buffer.len()
            )));
        }
        Ok(Self {
            indices,
            buffer: Arc::new(buffer),
        })
    }

    pub fn indices(&self) -> &BinIndices {
        &self.indices
    }

    pub fn indices_mut(&mut self) -> &mut BinIndices {
        &mut self.indices
    }

    pub fn buffer(&self) -> &BinBuffer {
        &self.buffer
    }

    pub fn coords(&self) -> &Coords {
        self.buffer.coords()
    }

    pub fn attrs(&self) -> &Coords {
        self.buffer.attrs()
    }

    pub fn event_dim(&self) -> &str {
        self.buffer.dim()
    }

    /// Whether the event buffer is shared with another array
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.buffer) > 1
    }

    /// Take a private copy of the event buffer if it is shared.
    pub fn make_independent(&mut self) {
        Arc::make_mut(&mut self.buffer);
    }

    pub fn buffer_mut(&mut self) -> &mut BinBuffer {
        Arc::make_mut(&mut self.buffer)
    }

    /// Per-bin view of an event coordinate or attribute
    pub fn event_value(&self, name: &str) -> Option<BinnedVariable> {
        self.coords()
            .get(name)
            .or_else(|| self.attrs().get(name))
            .map(|content| BinnedVariable {
                indices: self.indices.clone(),
                content: content.clone(),
            })
    }

    /// Store a per-bin value as an event coordinate. The value must share
    /// this array's bin structure.
    pub fn store_event(&mut self, name: &str, value: BinnedVariable) -> Result<(), ArrayError> {
        if value.indices != self.indices {
            return Err(ArrayError::BinMismatch(format!(
                "event value `{name}` does not share the bin indices of the array"
            )));
        }
        self.buffer_mut().set_coord(name, value.content)?;
        Ok(())
    }

    pub(crate) fn deep_copy(&self) -> Self {
        Self {
            indices: BinIndices {
                dims: self.indices.dims.clone(),
                ranges: self.indices.ranges.to_owned().into_shared(),
            },
            buffer: Arc::new(self.buffer.deep_copy()),
        }
    }
}

/// An event (per-bin) value: bin indices plus flat event content.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinnedVariable {
    indices: BinIndices,
    content: Variable,
}

impl BinnedVariable {
    pub fn new(indices: BinIndices, content: Variable) -> Result<Self, ArrayError> {
        if content.ndim() != 1 {
            return Err(ArrayError::DimensionMismatch(format!(
                "event content must be 1-D, got [{}]",
                content.dims().join(", ")
            )));
        }
        if indices.max_end() > content.len() {
            return Err(ArrayError::InvalidBins(format!(
                "bins reference event {} but content holds {} events",
                indices.max_end(),
                content.len()
            )));
        }
        Ok(Self { indices, content })
    }

    pub(crate) fn from_parts(indices: BinIndices, content: Variable) -> Self {
        Self { indices, content }
    }

    pub fn indices(&self) -> &BinIndices {
        &self.indices
    }

    pub fn content(&self) -> &Variable {
        &self.content
    }

    pub fn unit(&self) -> Option<&str> {
        self.content.unit()
    }

    /// Same bins, new content
    pub fn with_content(&self, content: Variable) -> Result<Self, ArrayError> {
        if content.dims() != self.content.dims() || content.len() != self.content.len() {
            return Err(ArrayError::ShapeMismatch {
                expected: self.content.shape().to_vec(),
                actual: content.shape().to_vec(),
            });
        }
        Ok(Self {
            indices: self.indices.clone(),
            content,
        })
    }

    /// Event values of each bin, in row-major bin order.
    pub fn bin_values(&self) -> Vec<Vec<f64>> {
        let values = self.content.to_vec();
        self.indices
            .ranges()
            .iter()
            .map(|&(begin, end)| values[begin..end].to_vec())
            .collect()
    }
}
