use pyo3::prelude::*;

mod errors;
pub use errors::Error;
pub mod geometry;
pub use geometry::{DikeGeometry, Patch, SegmentationGrid};
pub mod observations;
pub use observations::ObservationSet;
pub mod okada;
pub use okada::{DislocationSolver, DislocationType, Okada};
pub mod greens;
mod bayesian_schedule;
pub use bayesian_schedule::BayesianSchedule;
mod segmented_dike;
pub use segmented_dike::SegmentedDike;
mod logger;
use logger::init_logger;

/// A Python module implemented in Rust; bindings added here
#[pymodule]
fn segdike_rs(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(okada::okada_py, m)?)?;
    m.add_function(wrap_pyfunction!(init_logger, m)?)?;

    m.add_class::<SegmentedDike>()?;

    Ok(())
}
