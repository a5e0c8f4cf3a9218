use pyo3::PyErr;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use thiserror::Error;

// Define the possible **external** failures a forward-model evaluation can produce
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("segment counts must be positive: n_length={n_length}, n_width={n_width}")]
    NonPositiveSegmentCount { n_length: i64, n_width: i64 },

    #[error("expected {expected} openings (n_length * n_width), got {actual}")]
    OpeningCountMismatch { expected: usize, actual: usize },

    #[error("expected {expected} parameters, got {actual}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch { context: String, expected: usize, actual: usize },

    #[error("unknown dislocation type '{name}', expected one of: slip, dip_slip, open")]
    UnknownDislocationType { name: String },

    #[error("dislocation solver failed: {reason}")]
    SolverFailure { reason: String },
}

impl Error {
    pub fn shape_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        return Error::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        };
    }

    pub fn solver_failure(reason: impl Into<String>) -> Self {
        return Error::SolverFailure { reason: reason.into() };
    }
}

/// Configuration and shape errors are the caller's fault, solver failures are not
impl From<Error> for PyErr {
    fn from(error: Error) -> PyErr {
        let message: String = error.to_string();
        return match error {
            Error::SolverFailure { .. } => PyRuntimeError::new_err(message),
            _ => PyValueError::new_err(message),
        };
    }
}

#[test]
fn test_error_maps_to_python_exception() {
    use pyo3::Python;

    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        let opening_count: PyErr = Error::OpeningCountMismatch { expected: 4, actual: 3 }.into();
        assert!(opening_count.is_instance_of::<PyValueError>(py));

        let shape: PyErr = Error::shape_mismatch("model x", 5, 4).into();
        assert!(shape.is_instance_of::<PyValueError>(py));

        let solver: PyErr = Error::solver_failure("non-finite displacement").into();
        assert!(solver.is_instance_of::<PyRuntimeError>(py));
        assert!(!solver.is_instance_of::<PyValueError>(py));
        assert!(solver.to_string().contains("non-finite displacement"));
    });
}
