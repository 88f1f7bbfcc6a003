//! Pure domain logic for the rackwatch monitoring service.
//!
//! Everything in this crate is I/O-free: threshold vocabulary and layering,
//! PDU reading types, the classifier, reconciliation planning, roles, and the
//! shared error taxonomy. Persistence and transport live in `rackwatch-db`
//! and `rackwatch-api`.

pub mod classifier;
pub mod error;
pub mod pdu;
pub mod reconcile;
pub mod roles;
pub mod threshold_keys;
pub mod types;
