pub mod api;
pub mod error;
pub mod graph;
pub mod options;
pub mod producer;
mod rename;
mod roles;
pub mod signature;
pub mod transform;

pub use api::{Targets, Transformable, transform_coords};
pub use error::{Result, TransformError};
pub use graph::{Edge, EdgeSpec, Graph, GraphBuilder, OutputKey};
pub use options::TransformOptions;
pub use producer::{FnProducer, Pass, Producer, ProducerArgs, ProducerOutput, producer};
pub use roles::CoordPair;
pub use transform::CoordTransform;
