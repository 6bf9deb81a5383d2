use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::{ArcArray, Array, IxDyn, Zip, arr0};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ArrayError;

/// A dense, labeled array of `f64` values with an optional unit.
///
/// The values live in an `ArcArray`, so cloning a `Variable` shares the
/// buffer and the first mutation of a shared buffer copies it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variable {
    dims: Vec<String>,
    values: ArcArray<f64, IxDyn>,
    unit: Option<String>,
}

impl Variable {
    pub fn new<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        values: ArcArray<f64, IxDyn>,
    ) -> Result<Self, ArrayError> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != values.ndim() {
            return Err(ArrayError::DimensionMismatch(format!(
                "{} dims [{}] given for values of rank {}",
                dims.len(),
                dims.join(", "),
                values.ndim()
            )));
        }
        if let Some(dup) = dims.iter().duplicates().next() {
            return Err(ArrayError::DuplicateDimension(dup.clone()));
        }
        Ok(Self {
            dims,
            values,
            unit: None,
        })
    }

    /// Build a 1-D variable along `dim`
    pub fn from_vec(dim: &str, values: Vec<f64>) -> Self {
        let values = Array::from_vec(values).into_dyn().into_shared();
        Self {
            dims: vec![dim.to_string()],
            values,
            unit: None,
        }
    }

    /// Build a variable from a flat row-major buffer and explicit sizes.
    pub fn from_shape_vec<S: Into<String>>(
        dims: impl IntoIterator<Item = (S, usize)>,
        values: Vec<f64>,
    ) -> Result<Self, ArrayError> {
        let (dims, shape): (Vec<String>, Vec<usize>) =
            dims.into_iter().map(|(d, n)| (d.into(), n)).unzip();
        let values = ArcArray::from_shape_vec(IxDyn(&shape), values)?;
        Self::new(dims, values)
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            values: arr0(value).into_dyn().into_shared(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_unit_opt(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn sizes(&self) -> IndexMap<String, usize> {
        self.dims
            .iter()
            .cloned()
            .zip(self.values.shape().iter().copied())
            .collect()
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn values(&self) -> &ArcArray<f64, IxDyn> {
        &self.values
    }

    /// Values in row-major order
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Apply `f` element-wise, keeping dims and unit.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            dims: self.dims.clone(),
            values: self.values.mapv(f).into_shared(),
            unit: self.unit.clone(),
        }
    }

    /// Combine two variables element-wise.
    ///
    /// Dims must be identical, or one side must be 0-d in which case it is
    /// broadcast. The result takes the dims of the non-scalar operand and
    /// its unit, falling back to the other operand's unit if it has none.
    /// With identical dims the left operand decides.
    pub fn zip_with(&self, other: &Variable, f: impl Fn(f64, f64) -> f64) -> Result<Self, ArrayError> {
        if self.dims == other.dims {
            if self.shape() != other.shape() {
                return Err(ArrayError::ShapeMismatch {
                    expected: self.shape().to_vec(),
                    actual: other.shape().to_vec(),
                });
            }
            let values = Zip::from(&self.values)
                .and(&other.values)
                .map_collect(|&a, &b| f(a, b));
            return Ok(Self {
                dims: self.dims.clone(),
                values: values.into_shared(),
                unit: self.unit.clone(),
            });
        }
        if other.ndim() == 0 {
            let b = other.values.iter().copied().next().unwrap_or(f64::NAN);
            return Ok(self.map(|a| f(a, b)).with_unit_opt(self.unit.clone().or(other.unit.clone())));
        }
        if self.ndim() == 0 {
            let a = self.values.iter().copied().next().unwrap_or(f64::NAN);
            return Ok(other.map(|b| f(a, b)).with_unit_opt(other.unit.clone().or(self.unit.clone())));
        }
        Err(ArrayError::DimensionMismatch(format!(
            "cannot combine [{}] with [{}]",
            self.dims.join(", "),
            other.dims.join(", ")
        )))
    }

    pub fn rename_dim(&mut self, from: &str, to: &str) {
        for dim in self.dims.iter_mut() {
            if dim == from {
                *dim = to.to_string();
            }
        }
    }

    /// Copy with an unshared value buffer
    pub fn deep_copy(&self) -> Self {
        Self {
            dims: self.dims.clone(),
            values: self.values.to_owned().into_shared(),
            unit: self.unit.clone(),
        }
    }

    /// Whether both variables view the same buffer
    pub fn shares_buffer_with(&self, other: &Variable) -> bool {
        self.values.as_ptr() == other.values.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_must_match_dims() {
        let values = ArcArray::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let err = Variable::new(["x"], values).unwrap_err();
        assert!(matches!(err, ArrayError::DimensionMismatch(_)));
    }

    #[test]
    fn test_duplicate_dims_rejected() {
        let err = Variable::from_shape_vec([("x", 1), ("x", 2)], vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err, ArrayError::DuplicateDimension("x".to_string()));
    }

    #[test]
    fn test_zip_with_scalar_broadcast() {
        let a = Variable::from_vec("x", vec![1.0, 2.0, 3.0]).with_unit("m");
        let b = Variable::scalar(10.0);
        let c = a.zip_with(&b, |a, b| a * b).unwrap();
        assert_eq!(c.to_vec(), vec![10.0, 20.0, 30.0]);
        assert_eq!(c.unit(), Some("m"));
        assert_eq!(c.dims(), ["x".to_string()]);
    }

    #[test]
    fn test_zip_with_unit_independent_of_operand_order() {
        let s = Variable::scalar(2.0).with_unit("m");
        let v = Variable::from_vec("x", vec![1.0, 2.0]).with_unit("s");
        let left = s.zip_with(&v, |a, b| a * b).unwrap();
        let right = v.zip_with(&s, |a, b| a * b).unwrap();
        assert_eq!(left.unit(), Some("s"));
        assert_eq!(right.unit(), Some("s"));
        assert_eq!(left, right);

        let bare = Variable::from_vec("x", vec![1.0, 2.0]);
        assert_eq!(s.zip_with(&bare, |a, b| a * b).unwrap().unit(), Some("m"));
        assert_eq!(bare.zip_with(&s, |a, b| a * b).unwrap().unit(), Some("m"));
    }

    #[test]
    fn test_zip_with_mismatched_dims() {
        let a = Variable::from_vec("x", vec![1.0, 2.0]);
        let b = Variable::from_vec("y", vec![1.0, 2.0]);
        assert!(a.zip_with(&b, |a, b| a + b).is_err());
    }

    #[test]
    fn test_clone_shares_buffer_and_deep_copy_does_not() {
        let a = Variable::from_vec("x", vec![1.0, 2.0]);
        let shallow = a.clone();
        let deep = a.deep_copy();
        assert!(a.shares_buffer_with(&shallow));
        assert!(!a.shares_buffer_with(&deep));
        assert_eq!(a, deep);
    }

    #[test]
    fn test_rename_dim() {
        let mut a = Variable::from_shape_vec([("x", 1), ("y", 2)], vec![1.0, 2.0]).unwrap();
        a.rename_dim("y", "z");
        assert_eq!(a.dims(), ["x".to_string(), "z".to_string()]);
        assert_eq!(a.sizes().get("z"), Some(&2));
    }
}
