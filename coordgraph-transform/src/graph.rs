use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use itertools::Itertools;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{Result, TransformError};
use crate::producer::Producer;
use crate::signature::input_names;

/// Left-hand side of a graph entry: the name(s) an edge produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputKey {
    Single(String),
    Multiple(Vec<String>),
}

impl OutputKey {
    pub fn names(&self) -> Vec<String> {
        match self {
            OutputKey::Single(name) => vec![name.clone()],
            OutputKey::Multiple(names) => names.clone(),
        }
    }
}

impl From<&str> for OutputKey {
    fn from(name: &str) -> Self {
        OutputKey::Single(name.to_string())
    }
}

impl From<String> for OutputKey {
    fn from(name: String) -> Self {
        OutputKey::Single(name)
    }
}

impl From<Vec<String>> for OutputKey {
    fn from(names: Vec<String>) -> Self {
        OutputKey::Multiple(names)
    }
}

impl From<&[&str]> for OutputKey {
    fn from(names: &[&str]) -> Self {
        OutputKey::Multiple(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OutputKey {
    fn from(names: [&str; N]) -> Self {
        OutputKey::Multiple(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Right-hand side of a graph entry.
#[derive(Debug, Clone)]
pub enum EdgeSpec {
    /// The output is an alias of another coordinate
    Rename(String),
    Derive(Arc<dyn Producer>),
}

impl From<&str> for EdgeSpec {
    fn from(source: &str) -> Self {
        EdgeSpec::Rename(source.to_string())
    }
}

impl From<String> for EdgeSpec {
    fn from(source: String) -> Self {
        EdgeSpec::Rename(source)
    }
}

impl From<Arc<dyn Producer>> for EdgeSpec {
    fn from(producer: Arc<dyn Producer>) -> Self {
        EdgeSpec::Derive(producer)
    }
}

/// A validated edge. Multi-output edges are shared by all their outputs.
#[derive(Debug)]
pub enum Edge {
    Rename {
        source: String,
    },
    Derive {
        producer: Arc<dyn Producer>,
        inputs: Vec<String>,
        outputs: Vec<String>,
    },
}

impl Edge {
    pub fn inputs(&self) -> &[String] {
        match self {
            Edge::Rename { source } => std::slice::from_ref(source),
            Edge::Derive { inputs, .. } => inputs,
        }
    }

    pub fn is_rename(&self) -> bool {
        matches!(self, Edge::Rename { .. })
    }
}

/// Flattened name -> edge table of a coordinate-transformation graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    edges: IndexMap<String, Arc<Edge>>,
}

impl Graph {
    /// Validate and flatten `entries`. Fails if any output name is
    /// registered twice, if a rename is keyed by several names, or if a
    /// producer's inputs are not an exact list of names.
    pub fn try_new<K, E>(entries: impl IntoIterator<Item = (K, E)>) -> Result<Self>
    where
        K: Into<OutputKey>,
        E: Into<EdgeSpec>,
    {
        let mut edges: IndexMap<String, Arc<Edge>> = IndexMap::new();
        for (key, spec) in entries {
            let key = key.into();
            let outputs = key.names();
            if outputs.is_empty() {
                return Err(TransformError::GraphDefinition(
                    "graph entry without output names".to_string(),
                ));
            }

            let edge = match spec.into() {
                EdgeSpec::Rename(source) => {
                    if outputs.len() != 1 {
                        return Err(TransformError::GraphDefinition(format!(
                            "rename of `{source}` must have exactly one output, got ({})",
                            outputs.join(", ")
                        )));
                    }
                    Edge::Rename { source }
                }
                EdgeSpec::Derive(producer) => {
                    let inputs = input_names(producer.as_ref())?;
                    Edge::Derive {
                        producer,
                        inputs,
                        outputs: outputs.clone(),
                    }
                }
            };

            let edge = Arc::new(edge);
            for name in outputs {
                if edges.contains_key(&name) {
                    return Err(TransformError::GraphDefinition(format!(
                        "`{name}` has more than one producer in the graph"
                    )));
                }
                edges.insert(name, edge.clone());
            }
        }
        Ok(Self { edges })
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Edge> {
        self.edges.get(name).map(|edge| edge.as_ref())
    }

    /// Declared inputs of the edge producing `name`
    pub fn inputs_of(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(Edge::inputs)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Render the graph in graphviz dot format, for debugging.
    pub fn to_dot(&self) -> String {
        let mut graph = DiGraph::<String, &'static str>::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        let mut node = |graph: &mut DiGraph<String, &'static str>, name: &str| {
            *nodes
                .entry(name.to_string())
                .or_insert_with(|| graph.add_node(name.to_string()))
        };

        for (name, edge) in &self.edges {
            let target = node(&mut graph, name.as_str());
            let label = if edge.is_rename() { "rename" } else { "" };
            for input in edge.inputs().iter().unique() {
                let source = node(&mut graph, input.as_str());
                graph.add_edge(source, target, label);
            }
        }
        format!("{}", Dot::new(&graph))
    }
}

/// Incremental construction of a [`Graph`]; validation happens in `build`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    entries: Vec<(OutputKey, EdgeSpec)>,
}

impl GraphBuilder {
    /// Define `name` as an alias of `source`.
    pub fn rename(mut self, name: &str, source: &str) -> Self {
        self.entries
            .push((name.into(), EdgeSpec::Rename(source.to_string())));
        self
    }

    pub fn derive(mut self, name: &str, producer: Arc<dyn Producer>) -> Self {
        self.entries.push((name.into(), EdgeSpec::Derive(producer)));
        self
    }

    /// One producer computing several outputs at once.
    pub fn derive_many(mut self, names: &[&str], producer: Arc<dyn Producer>) -> Self {
        self.entries.push((names.into(), EdgeSpec::Derive(producer)));
        self
    }

    pub fn build(self) -> Result<Graph> {
        Graph::try_new(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::producer;
    use coordgraph_common::Variable;

    fn constant() -> Arc<dyn Producer> {
        producer(["a"], |_| Ok(Variable::scalar(0.0).into()))
    }

    #[test]
    fn test_flattens_multi_output_keys() {
        let graph = Graph::builder()
            .derive_many(&["b", "c"], constant())
            .rename("d", "b")
            .build()
            .unwrap();
        assert_eq!(graph.names().collect::<Vec<_>>(), vec!["b", "c", "d"]);
        assert!(graph.contains("c"));
        assert!(!graph.contains("a"));
        assert_eq!(graph.inputs_of("c").unwrap(), ["a".to_string()]);
        assert_eq!(graph.inputs_of("d").unwrap(), ["b".to_string()]);
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let err = Graph::builder()
            .derive_many(&["b", "c"], constant())
            .derive("c", constant())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::GraphDefinition("`c` has more than one producer in the graph".to_string())
        );
    }

    #[test]
    fn test_rename_with_multiple_outputs_rejected() {
        let entries: Vec<(OutputKey, EdgeSpec)> = vec![(["b", "c"].into(), "a".into())];
        assert!(matches!(
            Graph::try_new(entries),
            Err(TransformError::GraphDefinition(_))
        ));
    }

    #[test]
    fn test_variadic_producer_rejected() {
        let p = producer(["*args"], |_| Ok(Variable::scalar(0.0).into()));
        assert!(Graph::builder().derive("b", p).build().is_err());
    }

    #[test]
    fn test_to_dot() {
        let graph = Graph::builder()
            .derive("b", constant())
            .rename("c", "b")
            .build()
            .unwrap();
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("rename"));
        assert!(dot.contains("->"));
    }
}
