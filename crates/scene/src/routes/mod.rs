//! Animated arc routes between land points.
//!
//! - [`geometry`] builds the raised arc and the tube mesh around it.
//! - [`material`] holds the per-route uniforms and the trail function.
//! - [`lifecycle`] owns active routes: spawn, advance, retire.

pub mod geometry;
pub mod lifecycle;
pub mod material;

pub use geometry::*;
pub use lifecycle::*;
pub use material::*;
