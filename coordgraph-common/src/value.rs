use ndarray::Array1;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bins::BinnedVariable;
use crate::error::ArrayError;
use crate::variable::Variable;

/// A coordinate value as seen by producers: either aligned with the outer
/// array (dense) or nested inside each bin (event).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "kebab-case"))]
pub enum Value {
    Dense(Variable),
    Binned(BinnedVariable),
}

impl Value {
    pub fn is_binned(&self) -> bool {
        matches!(self, Value::Binned(_))
    }

    pub fn as_dense(&self) -> Option<&Variable> {
        match self {
            Value::Dense(var) => Some(var),
            Value::Binned(_) => None,
        }
    }

    pub fn as_binned(&self) -> Option<&BinnedVariable> {
        match self {
            Value::Dense(_) => None,
            Value::Binned(binned) => Some(binned),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Value::Dense(var) => var.unit(),
            Value::Binned(binned) => binned.unit(),
        }
    }

    pub fn with_unit(self, unit: &str) -> Self {
        match self {
            Value::Dense(var) => Value::Dense(var.with_unit(unit)),
            Value::Binned(binned) => {
                let content = binned.content().clone().with_unit(unit);
                Value::Binned(BinnedVariable::from_parts(binned.indices().clone(), content))
            }
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Value::Dense(var) => Value::Dense(var.map(f)),
            Value::Binned(binned) => Value::Binned(BinnedVariable::from_parts(
                binned.indices().clone(),
                binned.content().map(f),
            )),
        }
    }

    /// Combine two values element-wise, broadcasting dense values into bins.
    ///
    /// A binned result carries the unit of the event operand, or the dense
    /// operand's unit if the events have none, whichever side it is on.
    pub fn zip_with(&self, other: &Value, f: impl Fn(f64, f64) -> f64) -> Result<Self, ArrayError> {
        match (self, other) {
            (Value::Dense(a), Value::Dense(b)) => Ok(Value::Dense(a.zip_with(b, f)?)),
            (Value::Binned(a), Value::Binned(b)) => {
                if a.indices() != b.indices() {
                    return Err(ArrayError::BinMismatch(
                        "cannot combine event values with different bins".to_string(),
                    ));
                }
                let content = a.content().zip_with(b.content(), f)?;
                Ok(Value::Binned(a.with_content(content)?))
            }
            (Value::Binned(events), Value::Dense(dense)) => {
                Ok(Value::Binned(broadcast_into_bins(events, dense, |e, d| f(e, d))?))
            }
            (Value::Dense(dense), Value::Binned(events)) => {
                Ok(Value::Binned(broadcast_into_bins(events, dense, |e, d| f(d, e))?))
            }
        }
    }
}

/// Combine every event with the dense element of the bin it belongs to.
fn broadcast_into_bins(
    events: &BinnedVariable,
    dense: &Variable,
    f: impl Fn(f64, f64) -> f64,
) -> Result<BinnedVariable, ArrayError> {
    let indices = events.indices();
    let dense_values = if dense.ndim() == 0 {
        None
    } else if dense.dims() == indices.dims() && dense.shape() == indices.shape() {
        Some(dense.to_vec())
    } else {
        return Err(ArrayError::DimensionMismatch(format!(
            "dense operand [{}] does not match bin dims [{}]",
            dense.dims().join(", "),
            indices.dims().join(", ")
        )));
    };
    let scalar = dense.values().iter().copied().next().unwrap_or(f64::NAN);

    // Events outside every bin keep their original value.
    let mut out: Array1<f64> = events.content().values().iter().copied().collect();
    for (bin, &(begin, end)) in indices.ranges().iter().enumerate() {
        let d = dense_values.as_ref().map_or(scalar, |values| values[bin]);
        for event in begin..end {
            out[event] = f(out[event], d);
        }
    }

    let content = Variable::new(
        events.content().dims().to_vec(),
        out.into_dyn().into_shared(),
    )?
    .with_unit_opt(events.unit().or(dense.unit()).map(str::to_string));
    events.with_content(content)
}

impl From<Variable> for Value {
    fn from(var: Variable) -> Self {
        Value::Dense(var)
    }
}

impl From<BinnedVariable> for Value {
    fn from(binned: BinnedVariable) -> Self {
        Value::Binned(binned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::BinIndices;

    fn events() -> BinnedVariable {
        BinnedVariable::new(
            BinIndices::from_sizes("x", &[2, 1]),
            Variable::from_vec("event", vec![1.0, 2.0, 3.0]).with_unit("us"),
        )
        .unwrap()
    }

    #[test]
    fn test_binned_times_dense_broadcasts_per_bin() {
        let dense = Value::Dense(Variable::from_vec("x", vec![10.0, 100.0]));
        let out = Value::Binned(events()).zip_with(&dense, |e, d| e * d).unwrap();
        let binned = out.as_binned().unwrap();
        assert_eq!(binned.bin_values(), vec![vec![10.0, 20.0], vec![300.0]]);
        assert_eq!(binned.unit(), Some("us"));
    }

    #[test]
    fn test_dense_minus_binned_keeps_operand_order() {
        let dense = Value::Dense(Variable::from_vec("x", vec![10.0, 100.0]));
        let out = dense.zip_with(&Value::Binned(events()), |d, e| d - e).unwrap();
        assert_eq!(out.as_binned().unwrap().bin_values(), vec![vec![9.0, 8.0], vec![97.0]]);
    }

    #[test]
    fn test_binned_unit_independent_of_operand_order() {
        let dense = Value::Dense(Variable::scalar(2.0).with_unit("m"));
        let binned = Value::Binned(events());
        let left = dense.zip_with(&binned, |d, e| d * e).unwrap();
        let right = binned.zip_with(&dense, |e, d| e * d).unwrap();
        assert_eq!(left.unit(), Some("us"));
        assert_eq!(left, right);

        let bare = Value::Binned(BinnedVariable::from_parts(
            BinIndices::from_sizes("x", &[2, 1]),
            Variable::from_vec("event", vec![1.0, 2.0, 3.0]),
        ));
        assert_eq!(dense.zip_with(&bare, |d, e| d * e).unwrap().unit(), Some("m"));
        assert_eq!(bare.zip_with(&dense, |e, d| e * d).unwrap().unit(), Some("m"));
    }

    #[test]
    fn test_binned_with_mismatched_dense() {
        let dense = Value::Dense(Variable::from_vec("y", vec![10.0, 100.0]));
        assert!(Value::Binned(events()).zip_with(&dense, |e, d| e * d).is_err());
    }

    #[test]
    fn test_map_and_unit() {
        let out = Value::Binned(events()).map(|e| e * 2.0).with_unit("ms");
        assert!(out.is_binned());
        assert_eq!(out.unit(), Some("ms"));
        assert_eq!(out.as_binned().unwrap().bin_values(), vec![vec![2.0, 4.0], vec![6.0]]);
    }
}
