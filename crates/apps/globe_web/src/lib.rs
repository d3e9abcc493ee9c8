pub mod route_changes;
pub mod visualization;

#[cfg(target_arch = "wasm32")]
mod bindings;

pub use route_changes::RouteChanges;
pub use visualization::*;
