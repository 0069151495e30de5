mod cache_aside;
pub use cache_aside::*;

#[cfg(test)]
mod cache_aside_test;
