pub mod redis_fast_store;

pub use redis_fast_store::*;
