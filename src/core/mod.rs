mod cache;
mod counter;
mod lock;
mod reconcile;
mod shutdown;
mod ticket;

#[doc(hidden)]
pub use cache::*;
#[doc(hidden)]
pub use counter::*;
#[doc(hidden)]
pub use lock::*;
#[doc(hidden)]
pub use reconcile::*;
#[doc(hidden)]
pub use shutdown::*;
#[doc(hidden)]
pub use ticket::*;
