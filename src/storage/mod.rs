mod adaptors;
mod durable_store;
mod fast_store;

#[doc(hidden)]
pub use adaptors::*;
#[doc(hidden)]
pub use durable_store::*;
#[doc(hidden)]
pub use fast_store::*;
