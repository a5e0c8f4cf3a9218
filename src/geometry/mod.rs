// Load modules
mod dike_geometry;
mod patches;

// Expose functions to public
pub use dike_geometry::{DikeGeometry, N_GEOMETRY_PARAMETERS, SegmentationGrid};
pub use patches::{Patch, patches};
