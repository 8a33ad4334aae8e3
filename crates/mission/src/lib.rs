//! Mission façade crate: the commercial flight profile model and the crates it is built from.

pub mod mission;

pub use facade::*;
pub use sizing_config as config;
pub use sizing_model as model;

mod facade;
