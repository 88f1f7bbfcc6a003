//! The periodic evaluation engine.
//!
//! One cycle = fetch a complete PDU batch from NENG, classify every reading
//! against its effective thresholds, diff the critical set against the
//! active-alert table, apply the plan, and publish a fresh snapshot for the
//! read API. The runner owns the cadence and single-flight discipline.

pub mod evaluator;
pub mod neng;
pub mod runner;
pub mod snapshot;
