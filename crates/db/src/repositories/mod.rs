//! Repository layer for the monitoring stores.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod maintenance_repo;
pub mod threshold_repo;

pub use alert_repo::AlertRepo;
pub use maintenance_repo::MaintenanceRepo;
pub use threshold_repo::ThresholdRepo;
