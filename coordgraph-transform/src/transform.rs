use std::collections::HashSet;

use coordgraph_common::{BinnedVariable, DataArray, Value, Variable};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use tracing::{debug, warn};

use crate::error::{Result, TransformError};
use crate::graph::{Edge, Graph};
use crate::options::TransformOptions;
use crate::producer::{Pass, Producer, ProducerArgs};
use crate::rename::rename_dims;
use crate::roles::{ArraySnapshot, CoordPair};

/// Results of one production step, split by representation.
#[derive(Debug, Default)]
struct Produced {
    dense: IndexMap<String, Variable>,
    event: IndexMap<String, BinnedVariable>,
}

impl Produced {
    fn names(&self) -> Vec<String> {
        self.dense
            .keys()
            .chain(self.event.keys())
            .unique()
            .cloned()
            .collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.dense.contains_key(name) || self.event.contains_key(name)
    }
}

/// Resolver for one array: computes demanded names from a [`Graph`],
/// producing each name at most once and writing results into a private
/// snapshot of the input.
///
/// One instance serves exactly one top-level call; [`CoordTransform::finalize`]
/// consumes it and returns the only externally visible result.
#[derive(Debug)]
pub struct CoordTransform<'g> {
    snapshot: ArraySnapshot,
    graph: &'g Graph,
    outputs: IndexSet<String>,
    original: HashSet<String>,
    in_progress: Vec<String>,
    consumed: IndexSet<String>,
    aliases: IndexSet<String>,
    productions: IndexMap<Vec<String>, Vec<String>>,
    options: TransformOptions,
}

impl<'g> CoordTransform<'g> {
    pub fn new(obj: &DataArray, graph: &'g Graph, outputs: &[String], options: &TransformOptions) -> Self {
        let snapshot = ArraySnapshot::new(obj);
        let original = snapshot.names().into_iter().collect();
        Self {
            snapshot,
            graph,
            outputs: outputs.iter().cloned().collect(),
            original,
            in_progress: Vec::new(),
            consumed: IndexSet::new(),
            aliases: IndexSet::new(),
            productions: IndexMap::new(),
            options: *options,
        }
    }

    /// Current state of the working array
    pub fn array(&self) -> &DataArray {
        self.snapshot.array()
    }

    /// Resolve `name` as an input of another production step.
    ///
    /// Requested outputs are read as they are; any other name is demoted
    /// to the attribute role and recorded as consumed.
    pub fn resolve_as_input(&mut self, name: &str) -> Result<CoordPair> {
        self.ensure_present(name)?;
        if self.outputs.contains(name) {
            return Ok(self.snapshot.read(name));
        }
        if self.consumed.insert(name.to_string()) {
            debug!(name, "consumed");
        }
        self.snapshot.consume(name)
    }

    /// Resolve `name` as a requested output, leaving it in the coordinate role.
    pub fn resolve_as_final_output(&mut self, name: &str) -> Result<CoordPair> {
        self.ensure_present(name)?;
        self.snapshot.produce(name)
    }

    fn ensure_present(&mut self, name: &str) -> Result<()> {
        if self.snapshot.exists(name) {
            return Ok(());
        }
        self.add_coord(name)
    }

    fn add_coord(&mut self, name: &str) -> Result<()> {
        if self.in_progress.iter().any(|n| n == name) {
            let path = self
                .in_progress
                .iter()
                .map(String::as_str)
                .chain([name])
                .join(" -> ");
            return Err(TransformError::Cycle {
                name: name.to_string(),
                path,
            });
        }

        self.in_progress.push(name.to_string());
        let result = self.produce_coord(name);
        self.in_progress.pop();
        result
    }

    fn produce_coord(&mut self, name: &str) -> Result<()> {
        let graph = self.graph;
        let edge = graph
            .get(name)
            .ok_or_else(|| TransformError::UnresolvedName(name.to_string()))?;

        let produced = match edge {
            Edge::Rename { source } => {
                let pair = self.resolve_as_input(source)?;
                if pair.is_empty() {
                    return Err(TransformError::UnresolvedName(source.clone()));
                }
                self.aliases.insert(name.to_string());
                let mut produced = Produced::default();
                if let Some(dense) = pair.dense {
                    produced.dense.insert(name.to_string(), dense);
                }
                if let Some(event) = pair.event {
                    produced.event.insert(name.to_string(), event);
                }
                produced
            }
            Edge::Derive {
                producer,
                inputs,
                outputs,
            } => {
                let mut pairs = Vec::with_capacity(inputs.len());
                for input in inputs {
                    pairs.push((input.clone(), self.resolve_as_input(input)?));
                }
                let produced = self.run_producer(producer.as_ref(), &pairs, outputs)?;
                if !produced.contains(name) {
                    return Err(TransformError::GraphDefinition(format!(
                        "producer for `{name}` did not return `{name}`"
                    )));
                }
                produced
            }
        };

        let produced_names = produced.names();
        debug!(name, produced = ?produced_names, inputs = ?edge.inputs(), "produced");
        self.store(produced)?;
        self.productions
            .entry(edge.inputs().to_vec())
            .or_default()
            .extend(produced_names);
        Ok(())
    }

    /// Run the dense pass and, if any input has an event value, the event
    /// pass of one producer.
    fn run_producer(
        &self,
        producer: &dyn Producer,
        pairs: &[(String, CoordPair)],
        outputs: &[String],
    ) -> Result<Produced> {
        let mut produced = Produced::default();

        let dense_inputs: Option<IndexMap<String, Value>> = pairs
            .iter()
            .map(|(name, pair)| Some((name.clone(), Value::Dense(pair.dense.clone()?))))
            .collect();
        if let Some(values) = dense_inputs {
            let out = producer
                .produce(&ProducerArgs::new(values, Pass::Dense))?
                .into_map(outputs)?;
            for (name, value) in out {
                match value {
                    Value::Dense(var) => {
                        produced.dense.insert(name, var);
                    }
                    Value::Binned(binned) => {
                        produced.event.insert(name, binned);
                    }
                }
            }
        }

        if pairs.iter().any(|(_, pair)| pair.event.is_some()) {
            let mut values = IndexMap::new();
            for (name, pair) in pairs {
                let value = match (&pair.event, &pair.dense) {
                    (Some(event), _) => Value::Binned(event.clone()),
                    (None, Some(dense)) => Value::Dense(dense.clone()),
                    (None, None) => return Err(TransformError::UnresolvedName(name.clone())),
                };
                values.insert(name.clone(), value);
            }
            let out = producer
                .produce(&ProducerArgs::new(values, Pass::Event))?
                .into_map(outputs)?;
            for (name, value) in out {
                match value {
                    Value::Binned(binned) => {
                        produced.event.insert(name, binned);
                    }
                    Value::Dense(var) => self.merge_event_dense(&mut produced, name, var)?,
                }
            }
        }
        Ok(produced)
    }

    /// A dense result of the event pass joins the dense results. If the
    /// dense pass already produced the name, the event pass result wins
    /// unless consistency checking is enabled.
    fn merge_event_dense(&self, produced: &mut Produced, name: String, var: Variable) -> Result<()> {
        if let Some(existing) = produced.dense.get(&name) {
            if existing != &var {
                if self.options.check_consistency {
                    return Err(TransformError::Consistency(format!(
                        "`{name}` differs between the dense and event pass"
                    )));
                }
                warn!(name, "event pass overrides a different dense result");
            }
        }
        produced.dense.insert(name, var);
        Ok(())
    }

    fn store(&mut self, produced: Produced) -> Result<()> {
        for (name, var) in produced.dense {
            if let Some(existing) = self.snapshot.read(&name).dense {
                self.check_overwrite(&name, existing == var)?;
                continue;
            }
            self.snapshot.store_dense(&name, var)?;
        }
        for (name, binned) in produced.event {
            if let Some(existing) = self.snapshot.read(&name).event {
                self.check_overwrite(&name, existing == binned)?;
                continue;
            }
            self.snapshot.store_event(&name, binned)?;
        }
        Ok(())
    }

    /// Writing over an existing name keeps the existing value. That is legal
    /// for requested outputs and for equal values, and a collision otherwise.
    fn check_overwrite(&self, name: &str, equal: bool) -> Result<()> {
        if equal || self.outputs.contains(name) {
            debug!(name, "already present, keeping existing value");
            return Ok(());
        }
        Err(TransformError::CoordCollision(format!(
            "producing `{name}` would overwrite an existing, different value"
        )))
    }

    /// Produce every requested output, drop what the flags exclude and
    /// optionally rename dimensions.
    #[tracing::instrument(skip_all, fields(array = self.snapshot.array().name()))]
    pub fn finalize(mut self) -> Result<DataArray> {
        let options = self.options;
        for name in self.outputs.clone() {
            self.resolve_as_final_output(&name)?;
        }

        if !options.include_aliases {
            for alias in self.aliases.iter().filter(|a| !self.outputs.contains(*a)) {
                debug!(name = alias.as_str(), "dropping alias");
                self.snapshot.remove_any(alias);
            }
        }

        for name in &self.consumed {
            if self.outputs.contains(name) || !self.snapshot.in_attrs(name) {
                continue;
            }
            let original = self.original.contains(name);
            let keep = (options.keep_inputs && original) || (options.keep_intermediate && !original);
            if !keep {
                debug!(name = name.as_str(), original, "dropping consumed name");
                self.snapshot.remove_any(name);
            }
        }

        // By-products of multi-output steps that nobody asked for.
        for name in self.snapshot.coord_names() {
            if self.original.contains(&name) || self.outputs.contains(&name) {
                continue;
            }
            if options.keep_intermediate {
                self.snapshot.consume(&name)?;
            } else {
                debug!(name = name.as_str(), "dropping by-product");
                self.snapshot.remove_any(&name);
            }
        }

        if options.rename_dims {
            let renamed = rename_dims(self.snapshot.array(), &self.productions)?;
            self.snapshot.replace(renamed);
        }
        Ok(self.snapshot.into_inner())
    }
}
