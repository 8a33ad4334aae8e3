//! Commercial aircraft mission sizing.
//!
//! A flight profile (climb below 10,000 ft, climb to cruise altitude, cruise) is posed as a
//! geometric/signomial program that minimises take-off weight. The pieces live in separate
//! crates; this façade re-exports them so front-ends depend on one crate.

pub use sizing_config as config;
pub use sizing_export as export;
pub use sizing_mission as mission;
pub use sizing_model as model;
pub use sizing_solver as solver;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
