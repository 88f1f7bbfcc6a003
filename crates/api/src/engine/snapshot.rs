//! The latest-snapshot cell shared between the engine and read handlers.
//!
//! Single writer (the evaluation loop), many readers (request handlers).
//! Publication is an atomic pointer swap; readers never observe a partially
//! built snapshot and never copy the PDU list.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use rackwatch_core::classifier::{PduStatus, Reason};
use rackwatch_core::pdu::PduReading;
use rackwatch_core::types::Timestamp;

/// One PDU as served by `GET /racks`: the reading plus its classification
/// and maintenance flag.
#[derive(Debug, Clone, Serialize)]
pub struct PduStatusView {
    #[serde(flatten)]
    pub reading: PduReading,
    pub status: PduStatus,
    pub reasons: Vec<Reason>,
    pub in_maintenance: bool,
}

/// The product of one successful evaluation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RackSnapshot {
    /// Monotonic cycle id; also the ETag source for `GET /racks`.
    pub cycle: u64,
    /// When the cycle that produced this data completed.
    pub generated_at: Option<Timestamp>,
    /// True before the first successful cycle and after an upstream outage.
    pub stale: bool,
    pub pdus: Vec<PduStatusView>,
}

impl RackSnapshot {
    /// The pre-first-cycle snapshot: empty and already stale.
    pub fn empty() -> Self {
        Self {
            cycle: 0,
            generated_at: None,
            stale: true,
            pdus: Vec::new(),
        }
    }

    /// Distinct sites observed, sorted (UI filter source).
    pub fn sites(&self) -> Vec<String> {
        let mut sites: Vec<String> = self
            .pdus
            .iter()
            .map(|p| p.reading.site.clone())
            .filter(|s| !s.is_empty())
            .collect();
        sites.sort();
        sites.dedup();
        sites
    }
}

/// Cheaply cloneable handle to the atomically swapped snapshot.
#[derive(Clone)]
pub struct SnapshotCell {
    inner: Arc<ArcSwap<RackSnapshot>>,
}

impl SnapshotCell {
    /// Create a cell holding the empty snapshot.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(RackSnapshot::empty())),
        }
    }

    /// Load the current snapshot.
    pub fn load(&self) -> Arc<RackSnapshot> {
        self.inner.load_full()
    }

    /// Publish a freshly built snapshot.
    pub fn publish(&self, snapshot: RackSnapshot) {
        self.inner.store(Arc::new(snapshot));
    }

    /// Re-publish the current snapshot flagged stale (upstream outage).
    /// The PDU data stays serveable; only the marker changes.
    pub fn mark_stale(&self) {
        let current = self.load();
        if current.stale {
            return;
        }
        self.inner.store(Arc::new(RackSnapshot {
            cycle: current.cycle,
            generated_at: current.generated_at,
            stale: true,
            pdus: current.pdus.clone(),
        }));
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}
