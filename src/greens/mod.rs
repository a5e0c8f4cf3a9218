// Load modules
mod greens_dike;

// Expose functions to public
pub use greens_dike::{DIKE_DIP, greens_dike, greens_dike_okada};
