use std::fmt::Debug;
use std::sync::Arc;

use coordgraph_common::{ArrayError, BinnedVariable, Value, Variable};
use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::{Result, TransformError};

/// A graph edge that computes one or more coordinates from named inputs.
pub trait Producer: Debug + Send + Sync {
    /// Names of the coordinates this producer reads. The list is exact:
    /// it drives dependency resolution, so it cannot be variadic.
    fn inputs(&self) -> Vec<String>;

    /// Compute outputs. Called once with dense inputs and, for binned
    /// arrays, once more with event values substituted where available.
    fn produce(&self, args: &ProducerArgs) -> Result<ProducerOutput>;
}

/// Which representation a producer invocation is computing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Dense,
    Event,
}

/// Named input values of one producer invocation.
#[derive(Debug, Clone)]
pub struct ProducerArgs {
    values: IndexMap<String, Value>,
    pass: Pass,
}

impl ProducerArgs {
    pub fn new(values: IndexMap<String, Value>, pass: Pass) -> Self {
        Self { values, pass }
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| TransformError::UnresolvedName(name.to_string()))
    }

    /// Input `name`, which must be dense in this invocation.
    pub fn dense(&self, name: &str) -> Result<&Variable> {
        self.get(name)?.as_dense().ok_or_else(|| {
            TransformError::Array(ArrayError::BinMismatch(format!(
                "input `{name}` is a per-bin value, expected a dense value"
            )))
        })
    }

    /// Input `name`, which must be per-bin in this invocation.
    pub fn binned(&self, name: &str) -> Result<&BinnedVariable> {
        self.get(name)?.as_binned().ok_or_else(|| {
            TransformError::Array(ArrayError::BinMismatch(format!(
                "input `{name}` is a dense value, expected a per-bin value"
            )))
        })
    }

    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn is_event_pass(&self) -> bool {
        self.pass == Pass::Event
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// Result of a producer: one value for a single-output edge, or values
/// keyed by name for a multi-output edge.
#[derive(Debug, Clone, PartialEq)]
pub enum ProducerOutput {
    Single(Value),
    Multiple(IndexMap<String, Value>),
}

impl ProducerOutput {
    /// Normalize to a name -> value map against the edge's declared outputs.
    pub(crate) fn into_map(self, declared: &[String]) -> Result<IndexMap<String, Value>> {
        match self {
            ProducerOutput::Single(value) => match declared {
                [name] => Ok(IndexMap::from([(name.clone(), value)])),
                _ => Err(TransformError::GraphDefinition(format!(
                    "producer for ({}) returned a single value, expected one value per output",
                    declared.join(", ")
                ))),
            },
            ProducerOutput::Multiple(values) => {
                if let Some(name) = values.keys().find(|name| !declared.contains(name)) {
                    return Err(TransformError::GraphDefinition(format!(
                        "producer for ({}) returned undeclared output `{name}`",
                        declared.join(", ")
                    )));
                }
                Ok(values)
            }
        }
    }
}

impl From<Value> for ProducerOutput {
    fn from(value: Value) -> Self {
        ProducerOutput::Single(value)
    }
}

impl From<Variable> for ProducerOutput {
    fn from(var: Variable) -> Self {
        ProducerOutput::Single(Value::Dense(var))
    }
}

impl From<BinnedVariable> for ProducerOutput {
    fn from(binned: BinnedVariable) -> Self {
        ProducerOutput::Single(Value::Binned(binned))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for ProducerOutput {
    fn from_iter<T: IntoIterator<Item = (S, Value)>>(iter: T) -> Self {
        ProducerOutput::Multiple(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A [`Producer`] backed by a closure.
pub struct FnProducer<F> {
    inputs: Vec<String>,
    func: F,
}

impl<F> FnProducer<F>
where
    F: Fn(&ProducerArgs) -> Result<ProducerOutput> + Send + Sync,
{
    pub fn new<S: Into<String>>(inputs: impl IntoIterator<Item = S>, func: F) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            func,
        }
    }
}

impl<F> Debug for FnProducer<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FnProducer({})", self.inputs.iter().join(", "))
    }
}

impl<F> Producer for FnProducer<F>
where
    F: Fn(&ProducerArgs) -> Result<ProducerOutput> + Send + Sync,
{
    fn inputs(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn produce(&self, args: &ProducerArgs) -> Result<ProducerOutput> {
        (self.func)(args)
    }
}

/// Shorthand for a shared closure producer.
pub fn producer<S, F>(inputs: impl IntoIterator<Item = S>, func: F) -> Arc<dyn Producer>
where
    S: Into<String>,
    F: Fn(&ProducerArgs) -> Result<ProducerOutput> + Send + Sync + 'static,
{
    Arc::new(FnProducer::new(inputs, func))
}
