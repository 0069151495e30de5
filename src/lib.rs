mod config;
mod constants;
mod core;
mod errors;
mod metrics;
mod node;
mod storage;
pub mod utils;

pub use crate::core::*;

pub use config::*;
pub use errors::*;
pub use node::*;
pub use storage::*;

//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
