//! Roles and Permissions
//!
//! The backend returns roles in two shapes: a plain role-code string
//! (JWT claims) or a full object with id, name, code, and permissions
//! (the `/auth/me` response). Role matching normalizes both to an
//! uppercase code, preferring `code` over `name`.

use serde::{Deserialize, Serialize};

/// Snapshot of the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
}

impl UserSnapshot {
    /// Whether the user holds the given role (case-insensitive, code-priority)
    pub fn has_role(&self, required: &str) -> bool {
        let required = required.to_uppercase();
        self.roles.iter().any(|r| r.normalized_code() == required)
    }

    /// Whether the user holds at least one of the given roles
    pub fn has_any_role(&self, required: &[&str]) -> bool {
        required.iter().any(|r| self.has_role(r))
    }

    /// Whether the user holds a permission, keyed as `resource:action`
    pub fn has_permission(&self, required: &str) -> bool {
        self.roles.iter().any(|r| match r {
            RoleRef::Detailed { permissions, .. } => {
                permissions.iter().any(|p| p.key() == required)
            }
            RoleRef::Plain(_) => false,
        })
    }
}

/// A role reference as returned by the backend
///
/// Deserialized untagged: an object maps to `Detailed`, a bare string
/// to `Plain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Detailed {
        id: i64,
        name: String,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        permissions: Vec<Permission>,
    },
    Plain(String),
}

impl RoleRef {
    /// Canonical uppercase role code. `code` is the authoritative
    /// identifier when present; `name` is the fallback.
    pub fn normalized_code(&self) -> String {
        match self {
            RoleRef::Plain(code) => code.to_uppercase(),
            RoleRef::Detailed { name, code, .. } => code
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(name)
                .to_uppercase(),
        }
    }
}

/// A permission granted through a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Permission {
    /// Permission key in `resource:action` form
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }
}
