//! Well-known role name constants and permission predicates.
//!
//! The HTTP layer enforces these via extractor gates; the rest of the system
//! only ever consumes the boolean answers.

pub const ROLE_ADMINISTRATOR: &str = "administrator";
pub const ROLE_OPERATOR: &str = "operator";
pub const ROLE_TECHNICIAN: &str = "technician";
pub const ROLE_OBSERVER: &str = "observer";

/// All roles the service recognises.
pub const VALID_ROLES: &[&str] = &[
    ROLE_ADMINISTRATOR,
    ROLE_OPERATOR,
    ROLE_TECHNICIAN,
    ROLE_OBSERVER,
];

/// Whether `role` is one of the recognised role names.
pub fn is_known_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

/// Whether `role` may create, update, or reset threshold configuration.
pub fn can_edit_thresholds(role: &str) -> bool {
    matches!(role, ROLE_ADMINISTRATOR | ROLE_OPERATOR)
}

/// Whether `role` may start or end maintenance (including bulk import).
pub fn can_manage_maintenance(role: &str) -> bool {
    matches!(role, ROLE_ADMINISTRATOR | ROLE_OPERATOR | ROLE_TECHNICIAN)
}

/// Whether `role` may export the active-alert table.
pub fn can_export_alerts(role: &str) -> bool {
    matches!(role, ROLE_ADMINISTRATOR | ROLE_OPERATOR | ROLE_TECHNICIAN)
}
