pub mod alerts;
pub mod maintenance;
pub mod racks;
pub mod thresholds;
