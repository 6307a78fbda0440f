//! Identity snapshot embedded in access tokens.
//!
//! Identities are owned by the external user directory; the token core only
//! copies them into claims and reads them back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Subject identity: id, email, roles and optional permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque subject identifier
    pub subject_id: String,

    /// Contact email
    pub email: String,

    /// Role labels
    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// Permission labels, when the directory tracks them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<String>>,
}

impl Identity {
    /// Creates an identity without roles or permissions
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            roles: BTreeSet::new(),
            permissions: None,
        }
    }

    /// Replaces the role set
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the permission set
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    /// Checks the identity can be embedded in a token
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject_id.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: "subject_id".to_string(),
            });
        }
        Ok(())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True when the identity holds at least one of `allowed`.
    /// An empty `allowed` set admits every identity.
    pub fn has_any_role(&self, allowed: &BTreeSet<String>) -> bool {
        allowed.is_empty() || !self.roles.is_disjoint(allowed)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|permissions| permissions.contains(permission))
    }
}
