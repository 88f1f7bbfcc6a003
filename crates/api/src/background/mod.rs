pub mod stale_alerts;
