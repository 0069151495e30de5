mod shutdown_coordinator;
pub use shutdown_coordinator::*;
