pub mod land_mask;
pub mod raster;

pub use land_mask::*;
pub use raster::*;
