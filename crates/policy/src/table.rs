//! Policy table types and lookups.

use askdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Permission a role holds over one department's documents.
///
/// Ordered so that `Read <= Full` comparisons express "at least read".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// No visibility at all
    None,
    /// May retrieve the department's documents
    Read,
    /// Full data visibility, including department dumps
    Full,
}

/// One role's configuration: display info plus its permission row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleGrants {
    /// Human-readable role name (e.g., "Finance Team")
    pub name: String,

    /// Short description of what the role may see
    pub description: String,

    /// Permission level per department; departments absent from this
    /// map are treated as `none`
    pub permissions: BTreeMap<String, PermissionLevel>,
}

/// Immutable role/department permission table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTable {
    /// Known departments (content partitions), fixed at deploy time
    pub departments: Vec<String>,

    /// Role identifier -> grants
    pub roles: BTreeMap<String, RoleGrants>,
}

impl PolicyTable {
    /// Load a policy table from a YAML file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read policy file {:?}: {}", path, e))
        })?;

        let table: PolicyTable = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse policy file {:?}: {}", path, e))
        })?;

        table.validate()?;
        tracing::info!(
            "Loaded policy table from {:?}: {} roles, {} departments",
            path,
            table.roles.len(),
            table.departments.len()
        );
        Ok(table)
    }

    /// Reject tables that grant permissions over unknown departments.
    pub fn validate(&self) -> AppResult<()> {
        if self.departments.is_empty() {
            return Err(AppError::Config(
                "Policy table declares no departments".to_string(),
            ));
        }
        for (role, grants) in &self.roles {
            for department in grants.permissions.keys() {
                if !self.departments.contains(department) {
                    return Err(AppError::Config(format!(
                        "Role '{}' grants access to unknown department '{}'",
                        role, department
                    )));
                }
            }
        }
        Ok(())
    }

    /// Permission a role holds over a department.
    ///
    /// Fails closed: unknown roles and departments yield `None`.
    pub fn permission(&self, role: &str, department: &str) -> PermissionLevel {
        if !self.departments.iter().any(|d| d == department) {
            return PermissionLevel::None;
        }
        self.roles
            .get(role)
            .and_then(|grants| grants.permissions.get(department))
            .copied()
            .unwrap_or(PermissionLevel::None)
    }

    /// Every department the role may access at `minimum_level` or above.
    ///
    /// Pure and uncached; callers must invoke this fresh for every query.
    pub fn accessible_departments(
        &self,
        role: &str,
        minimum_level: PermissionLevel,
    ) -> BTreeSet<String> {
        self.departments
            .iter()
            .filter(|department| self.permission(role, department) >= minimum_level)
            .cloned()
            .collect()
    }

    /// Full grants for a role, if configured.
    pub fn role_grants(&self, role: &str) -> Option<&RoleGrants> {
        self.roles.get(role)
    }

    /// All configured role identifiers.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }

    /// Built-in table matching the standard deployment: five content
    /// partitions and six caller roles.
    pub fn builtin() -> Self {
        let departments = vec![
            "engineering".to_string(),
            "finance".to_string(),
            "general".to_string(),
            "hr".to_string(),
            "marketing".to_string(),
        ];

        let mut roles = BTreeMap::new();

        roles.insert(
            "finance".to_string(),
            RoleGrants {
                name: "Finance Team".to_string(),
                description:
                    "Access to financial reports, marketing expenses, equipment costs, and reimbursements."
                        .to_string(),
                permissions: grants(&[
                    ("finance", PermissionLevel::Full),
                    ("general", PermissionLevel::Read),
                    ("marketing", PermissionLevel::Read),
                    ("hr", PermissionLevel::Read),
                    ("engineering", PermissionLevel::None),
                ]),
            },
        );

        roles.insert(
            "marketing".to_string(),
            RoleGrants {
                name: "Marketing Team".to_string(),
                description:
                    "Access to campaign performance data, customer feedback, and sales metrics."
                        .to_string(),
                permissions: grants(&[
                    ("marketing", PermissionLevel::Full),
                    ("general", PermissionLevel::Read),
                    ("finance", PermissionLevel::Read),
                    ("hr", PermissionLevel::None),
                    ("engineering", PermissionLevel::None),
                ]),
            },
        );

        roles.insert(
            "hr".to_string(),
            RoleGrants {
                name: "HR Team".to_string(),
                description:
                    "Access to employee data, attendance records, payroll, and performance reviews."
                        .to_string(),
                permissions: grants(&[
                    ("hr", PermissionLevel::Full),
                    ("general", PermissionLevel::Read),
                    ("finance", PermissionLevel::Read),
                    ("marketing", PermissionLevel::None),
                    ("engineering", PermissionLevel::None),
                ]),
            },
        );

        roles.insert(
            "engineering".to_string(),
            RoleGrants {
                name: "Engineering Department".to_string(),
                description:
                    "Access to technical architecture, development processes, and operational guidelines."
                        .to_string(),
                permissions: grants(&[
                    ("engineering", PermissionLevel::Full),
                    ("general", PermissionLevel::Read),
                    ("finance", PermissionLevel::None),
                    ("marketing", PermissionLevel::None),
                    ("hr", PermissionLevel::None),
                ]),
            },
        );

        roles.insert(
            "c_level".to_string(),
            RoleGrants {
                name: "C-Level Executives".to_string(),
                description: "Full access to all company data.".to_string(),
                permissions: grants(&[
                    ("finance", PermissionLevel::Full),
                    ("marketing", PermissionLevel::Full),
                    ("hr", PermissionLevel::Full),
                    ("engineering", PermissionLevel::Full),
                    ("general", PermissionLevel::Full),
                ]),
            },
        );

        roles.insert(
            "employee".to_string(),
            RoleGrants {
                name: "Employee Level".to_string(),
                description:
                    "Access only to general company information such as policies, events, and FAQs."
                        .to_string(),
                permissions: grants(&[
                    ("general", PermissionLevel::Read),
                    ("finance", PermissionLevel::None),
                    ("marketing", PermissionLevel::None),
                    ("hr", PermissionLevel::None),
                    ("engineering", PermissionLevel::None),
                ]),
            },
        );

        Self { departments, roles }
    }
}

fn grants(entries: &[(&str, PermissionLevel)]) -> BTreeMap<String, PermissionLevel> {
    entries
        .iter()
        .map(|(department, level)| (department.to_string(), *level))
        .collect()
}
