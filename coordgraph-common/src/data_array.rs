use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bins::Bins;
use crate::coords::Coords;
use crate::error::ArrayError;
use crate::variable::Variable;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "kebab-case"))]
pub enum ArrayData {
    Dense(Variable),
    Binned(Bins),
}

/// A labeled array: data plus coordinates (kept by default) and
/// attributes (auxiliary).
///
/// If the data is binned, the bins carry a second, nested namespace of
/// event coordinates and attributes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataArray {
    name: String,
    data: ArrayData,
    coords: Coords,
    attrs: Coords,
}

impl DataArray {
    pub fn new(name: &str, data: Variable) -> Self {
        Self {
            name: name.to_string(),
            data: ArrayData::Dense(data),
            coords: Coords::new(),
            attrs: Coords::new(),
        }
    }

    pub fn new_binned(name: &str, bins: Bins) -> Self {
        Self {
            name: name.to_string(),
            data: ArrayData::Binned(bins),
            coords: Coords::new(),
            attrs: Coords::new(),
        }
    }

    /// Builder-style [`DataArray::set_coord`]
    pub fn with_coord(mut self, name: &str, var: Variable) -> Result<Self, ArrayError> {
        self.set_coord(name, var)?;
        Ok(self)
    }

    /// Builder-style [`DataArray::set_attr`]
    pub fn with_attr(mut self, name: &str, var: Variable) -> Result<Self, ArrayError> {
        self.set_attr(name, var)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn dims(&self) -> &[String] {
        match &self.data {
            ArrayData::Dense(var) => var.dims(),
            ArrayData::Binned(bins) => bins.indices().dims(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match &self.data {
            ArrayData::Dense(var) => var.shape(),
            ArrayData::Binned(bins) => bins.indices().shape(),
        }
    }

    pub fn sizes(&self) -> IndexMap<String, usize> {
        self.dims()
            .iter()
            .cloned()
            .zip(self.shape().iter().copied())
            .collect()
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

    /// Coordinates and attributes, borrowed together
    pub fn namespaces_mut(&mut self) -> (&mut Coords, &mut Coords) {
        (&mut self.coords, &mut self.attrs)
    }

    pub fn bins(&self) -> Option<&Bins> {
        match &self.data {
            ArrayData::Dense(_) => None,
            ArrayData::Binned(bins) => Some(bins),
        }
    }

    pub fn bins_mut(&mut self) -> Option<&mut Bins> {
        match &mut self.data {
            ArrayData::Dense(_) => None,
            ArrayData::Binned(bins) => Some(bins),
        }
    }

    pub fn is_binned(&self) -> bool {
        self.bins().is_some()
    }

    pub fn set_coord(&mut self, name: &str, var: Variable) -> Result<Option<Variable>, ArrayError> {
        self.check_dims(name, &var)?;
        Ok(self.coords.insert(name, var))
    }

    pub fn set_attr(&mut self, name: &str, var: Variable) -> Result<Option<Variable>, ArrayError> {
        self.check_dims(name, &var)?;
        Ok(self.attrs.insert(name, var))
    }

    /// Whether `name` exists in any namespace, dense or nested.
    pub fn contains_any(&self, name: &str) -> bool {
        self.coords.contains(name)
            || self.attrs.contains(name)
            || self
                .bins()
                .is_some_and(|bins| bins.coords().contains(name) || bins.attrs().contains(name))
    }

    /// Remove `name` from every namespace, dense and nested.
    pub fn remove_any(&mut self, name: &str) {
        self.coords.pop(name);
        self.attrs.pop(name);
        if let Some(bins) = self.bins_mut() {
            if bins.coords().contains(name) || bins.attrs().contains(name) {
                let buffer = bins.buffer_mut();
                buffer.coords_mut().pop(name);
                buffer.attrs_mut().pop(name);
            }
        }
    }

    /// Copy the array. A shallow copy shares every value buffer and the
    /// event buffer; writes to the copy's namespaces never reach `self`.
    pub fn copy(&self, deep: bool) -> Self {
        if !deep {
            return self.clone();
        }
        Self {
            name: self.name.clone(),
            data: match &self.data {
                ArrayData::Dense(var) => ArrayData::Dense(var.deep_copy()),
                ArrayData::Binned(bins) => ArrayData::Binned(bins.deep_copy()),
            },
            coords: self.coords.deep_copy(),
            attrs: self.attrs.deep_copy(),
        }
    }

    /// Return a copy with dimension labels renamed according to `mapping`.
    pub fn rename_dims(&self, mapping: &[(&str, &str)]) -> Result<Self, ArrayError> {
        let dims = self.dims();
        for &(from, to) in mapping {
            if !dims.iter().any(|d| d == from) {
                return Err(ArrayError::DimensionMismatch(format!(
                    "cannot rename `{from}`: not a dimension of [{}]",
                    dims.join(", ")
                )));
            }
            if from != to && dims.iter().any(|d| d == to) {
                return Err(ArrayError::DuplicateDimension(to.to_string()));
            }
        }

        let mut out = self.clone();
        for &(from, to) in mapping {
            match &mut out.data {
                ArrayData::Dense(var) => var.rename_dim(from, to),
                ArrayData::Binned(bins) => bins.indices_mut().rename_dim(from, to),
            }
            for (_, var) in out.coords.iter_mut().chain(out.attrs.iter_mut()) {
                var.rename_dim(from, to);
            }
        }
        Ok(out)
    }

    fn check_dims(&self, name: &str, var: &Variable) -> Result<(), ArrayError> {
        let sizes = self.sizes();
        for (dim, len) in var.sizes() {
            match sizes.get(&dim) {
                Some(&expected) if expected == len => {}
                Some(&expected) => {
                    return Err(ArrayError::DimensionMismatch(format!(
                        "`{name}` has length {len} along `{dim}`, array has {expected}"
                    )));
                }
                None => {
                    return Err(ArrayError::DimensionMismatch(format!(
                        "`{name}` has dimension `{dim}` which is not in [{}]",
                        self.dims().join(", ")
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::{BinBuffer, BinIndices};

    fn make_array() -> DataArray {
        DataArray::new("counts", Variable::from_vec("tof", vec![0.0, 1.0, 2.0]))
            .with_coord("tof", Variable::from_vec("tof", vec![10.0, 20.0, 30.0]))
            .unwrap()
            .with_attr("L", Variable::scalar(2.5).with_unit("m"))
            .unwrap()
    }

    fn make_binned() -> DataArray {
        let buffer = BinBuffer::new("event", Variable::from_vec("event", vec![1.0; 3])).unwrap();
        let mut bins = Bins::new(BinIndices::from_sizes("x", &[1, 2]), buffer).unwrap();
        bins.buffer_mut()
            .set_coord("t", Variable::from_vec("event", vec![1.0, 2.0, 3.0]))
            .unwrap();
        DataArray::new_binned("events", bins)
    }

    #[test]
    fn test_set_coord_checks_dims() {
        let mut da = make_array();
        assert!(da.set_coord("bad", Variable::from_vec("tof", vec![1.0])).is_err());
        assert!(da.set_coord("bad", Variable::from_vec("y", vec![1.0, 2.0, 3.0])).is_err());
        assert!(da.set_coord("ok", Variable::scalar(1.0)).is_ok());
    }

    #[test]
    fn test_rename_dims_renames_coords_and_attrs() {
        let da = make_array()
            .with_attr("tof_attr", Variable::from_vec("tof", vec![1.0, 2.0, 3.0]))
            .unwrap();
        let renamed = da.rename_dims(&[("tof", "time")]).unwrap();
        assert_eq!(renamed.dims(), ["time".to_string()]);
        assert_eq!(renamed.coords().get("tof").unwrap().dims(), ["time".to_string()]);
        assert_eq!(renamed.attrs().get("tof_attr").unwrap().dims(), ["time".to_string()]);
        assert_eq!(da.dims(), ["tof".to_string()]);
    }

    #[test]
    fn test_rename_dims_collision() {
        let da = DataArray::new(
            "a",
            Variable::from_shape_vec([("x", 1), ("y", 1)], vec![0.0]).unwrap(),
        );
        assert_eq!(
            da.rename_dims(&[("x", "y")]).unwrap_err(),
            ArrayError::DuplicateDimension("y".to_string())
        );
        assert!(da.rename_dims(&[("z", "w")]).is_err());
    }

    #[test]
    fn test_shallow_copy_isolated_from_original() {
        let da = make_binned();
        let mut copy = da.copy(false);
        copy.coords_mut().insert("new", Variable::scalar(1.0));
        copy.remove_any("t");
        assert!(!da.contains_any("new"));
        assert!(da.contains_any("t"));
        assert!(!copy.contains_any("t"));
    }

    #[test]
    fn test_deep_copy_equal_but_unshared() {
        let da = make_array();
        let deep = da.copy(true);
        assert_eq!(da, deep);
        assert!(!da.coords().get("tof").unwrap().shares_buffer_with(deep.coords().get("tof").unwrap()));
    }

    #[test]
    fn test_binned_dims() {
        let da = make_binned();
        assert!(da.is_binned());
        assert_eq!(da.sizes().get("x"), Some(&2));
    }
}
