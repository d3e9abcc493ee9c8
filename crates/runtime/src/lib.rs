pub mod config;
pub mod device;
pub mod event_bus;
pub mod frame;
pub mod metrics;
pub mod scheduler;

pub use config::*;
pub use device::*;
pub use event_bus::*;
pub use frame::*;
pub use metrics::Metrics;
pub use scheduler::*;
