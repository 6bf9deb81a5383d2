//! Labeled, unit-tagged arrays with dense and binned (event) coordinates.
//!
//! This is the array container the coordinate-transformation engine in
//! `coordgraph-transform` operates on. Arithmetic is limited to what
//! coordinate producers need; units are carried as opaque labels.

pub mod bins;
pub mod coords;
pub mod data_array;
pub mod dataset;
pub mod error;
pub mod value;
pub mod variable;

pub use bins::{BinBuffer, BinIndices, BinnedVariable, Bins};
pub use coords::Coords;
pub use data_array::{ArrayData, DataArray};
pub use dataset::Dataset;
pub use error::ArrayError;
pub use value::Value;
pub use variable::Variable;
