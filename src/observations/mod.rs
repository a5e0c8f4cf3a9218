// Load modules
mod observation_set;

// Expose
pub use observation_set::ObservationSet;
