pub mod mem_durable_store;
pub mod mem_fast_store;

pub use mem_durable_store::*;
pub use mem_fast_store::*;
