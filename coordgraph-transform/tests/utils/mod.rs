#![allow(dead_code)]

use coordgraph_common::{BinBuffer, BinIndices, Bins, DataArray, Value, Variable};
use coordgraph_transform::{Graph, Result, producer};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a test subscriber controlled by `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

/// Time-of-flight data with flight-path lengths as scalar coordinates.
pub fn tof_array() -> DataArray {
    DataArray::new("counts", Variable::from_vec("tof", vec![3.0, 5.0, 7.0]))
        .with_coord("tof", Variable::from_vec("tof", vec![100.0, 200.0, 300.0]).with_unit("us"))
        .and_then(|da| da.with_coord("L1", Variable::scalar(10.0).with_unit("m")))
        .and_then(|da| da.with_coord("L2", Variable::scalar(2.0).with_unit("m")))
        .unwrap()
}

/// Events binned along `x`, with a dense `x` coordinate, a per-event
/// `tof` and a scalar flight path `L`.
pub fn event_array() -> DataArray {
    let buffer = BinBuffer::new("event", Variable::from_vec("event", vec![1.0; 5])).unwrap();
    let mut bins = Bins::new(BinIndices::from_sizes("x", &[2, 0, 3]), buffer).unwrap();
    bins.buffer_mut()
        .set_coord(
            "tof",
            Variable::from_vec("event", vec![10.0, 20.0, 30.0, 40.0, 50.0]).with_unit("us"),
        )
        .unwrap();
    DataArray::new_binned("events", bins)
        .with_coord("x", Variable::from_vec("x", vec![0.0, 1.0, 2.0]).with_unit("m"))
        .and_then(|da| da.with_coord("L", Variable::scalar(4.0).with_unit("m")))
        .unwrap()
}

/// `L = L1 + L2`, `speed = L / tof`, `wavelength = speed * 2`.
pub fn beamline_graph() -> Result<Graph> {
    Graph::builder()
        .derive(
            "L",
            producer(["L1", "L2"], |args| {
                Ok(args.get("L1")?.zip_with(args.get("L2")?, |a, b| a + b)?.into())
            }),
        )
        .derive(
            "speed",
            producer(["L", "tof"], |args| {
                let speed: Value = args.get("L")?.zip_with(args.get("tof")?, |l, t| l / t)?;
                Ok(speed.with_unit("m/us").into())
            }),
        )
        .derive(
            "wavelength",
            producer(["speed"], |args| {
                Ok(args.get("speed")?.map(|s| s * 2.0).with_unit("angstrom").into())
            }),
        )
        .build()
}
