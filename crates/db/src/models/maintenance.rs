//! Maintenance registry entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rackwatch_core::types::{DbId, Timestamp};

/// Entry type string for a single-rack suppression.
pub const ENTRY_TYPE_INDIVIDUAL_RACK: &str = "individual_rack";
/// Entry type string for a chain-wide suppression snapshot.
pub const ENTRY_TYPE_CHAIN: &str = "chain";

/// A maintenance entry (`maintenance_entries` row).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaintenanceEntry {
    pub id: DbId,
    pub entry_type: String,
    pub rack_id: Option<String>,
    pub chain: Option<String>,
    pub site: String,
    pub dc: String,
    pub reason: String,
    pub started_by: String,
    pub started_at: Timestamp,
}

/// One rack covered by an entry (`maintenance_rack_details` row).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaintenanceRackDetail {
    pub id: DbId,
    pub entry_id: DbId,
    pub rack_id: String,
    pub country: String,
    pub site: String,
    pub dc: String,
    pub chain: String,
    pub created_at: Timestamp,
}

/// An entry joined with its detail rows, as served to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceEntryWithDetails {
    #[serde(flatten)]
    pub entry: MaintenanceEntry,
    pub racks: Vec<MaintenanceRackDetail>,
}

/// DTO for starting individual-rack maintenance.
#[derive(Debug, Clone, Deserialize)]
pub struct StartIndividualMaintenance {
    pub rack_id: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub dc: String,
    #[serde(default)]
    pub chain: String,
    pub reason: String,
    pub started_by: String,
}

/// DTO for starting chain maintenance. The racks themselves come from the
/// caller's snapshot of the live inventory.
#[derive(Debug, Clone, Deserialize)]
pub struct StartChainMaintenance {
    pub chain: String,
    pub site: String,
    pub dc: String,
    pub reason: String,
    pub started_by: String,
}

/// A rack that matched the chain at start time (snapshot membership).
#[derive(Debug, Clone)]
pub struct ChainRackCandidate {
    pub rack_id: String,
    pub country: String,
    pub site: String,
    pub dc: String,
    pub chain: String,
}

/// Result of a chain start.
#[derive(Debug)]
pub enum ChainStartOutcome {
    /// The entry was created; `skipped` racks were already in maintenance.
    Started {
        entry: MaintenanceEntry,
        added: Vec<String>,
        skipped: Vec<String>,
    },
    /// Every matching rack was already in maintenance; nothing was created.
    AllAlreadyInMaintenance { skipped: Vec<String> },
}

/// Summary returned by the chain-start endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChainStartSummary {
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

/// One failed row in a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRowFailure {
    /// 1-based row number in the uploaded file.
    pub row: usize,
    pub rack_id: String,
    pub message: String,
}

/// Per-row summary of a bulk maintenance import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub successful: usize,
    pub already_in_maintenance: usize,
    pub failed: Vec<ImportRowFailure>,
}
