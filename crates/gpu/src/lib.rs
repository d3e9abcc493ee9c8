pub mod buffers;
pub mod renderer;
pub mod shaders;

pub use buffers::*;
pub use renderer::*;
