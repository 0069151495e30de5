mod reconciler;
pub use reconciler::*;

#[cfg(test)]
mod reconciler_test;
