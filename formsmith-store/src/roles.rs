//! User roles at the identity boundary.
//!
//! The engine never issues or verifies credentials; it receives a resolved
//! role alongside a form and gates affordances with it.

use serde::{Deserialize, Serialize};

/// The caller's resolved role for one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl UserRole {
    /// Whether this role may modify the form definition.
    pub fn can_edit(&self) -> bool {
        !matches!(self, Self::Viewer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
