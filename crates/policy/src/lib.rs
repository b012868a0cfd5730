//! Role-based access policy for the askdesk retrieval service.
//!
//! A [`PolicyTable`] maps every role to a permission row: one
//! [`PermissionLevel`] per known department. The table is immutable
//! configuration, loaded once at process start (built-in defaults or a
//! YAML file), and is the sole security boundary for retrieval — the
//! index filter and the orchestrator's authorization step are both
//! derived from it, fresh on every query.
//!
//! All lookups fail closed: an unknown role or department always
//! resolves to [`PermissionLevel::None`], never to an error and never
//! to a readable default.

mod table;

pub use table::{PermissionLevel, PolicyTable, RoleGrants};
