pub mod point_field;
pub mod routes;

pub use point_field::*;
