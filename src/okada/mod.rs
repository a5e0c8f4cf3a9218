// Load modules
mod dislocation_solver;
mod okada85;

// Expose functions to public
pub use dislocation_solver::{DislocationSolver, DislocationType, N_DISLOCATION_PARAMETERS, Okada, okada_py};
pub use okada85::okada85;
