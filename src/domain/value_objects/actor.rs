//! # Actor
//!
//! The already-authenticated caller of every marketplace operation.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::enums::Role;
use crate::domain::value_objects::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated user and the role they act in.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::value_objects::Actor;
///
/// let vendor = Actor::vendor("v-1");
/// assert!(vendor.require_vendor().is_ok());
/// assert!(vendor.require_supplier().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(id),
            role,
        }
    }

    /// Creates a vendor actor.
    #[must_use]
    pub fn vendor(id: impl Into<String>) -> Self {
        Self::new(id, Role::Vendor)
    }

    /// Creates a supplier actor.
    #[must_use]
    pub fn supplier(id: impl Into<String>) -> Self {
        Self::new(id, Role::Supplier)
    }

    /// Returns the user id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the role.
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns true if this actor is the given user.
    #[inline]
    #[must_use]
    pub fn is(&self, user: &UserId) -> bool {
        &self.id == user
    }

    /// Fails with `Forbidden` unless the actor holds `role`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` on a role mismatch.
    pub fn require_role(&self, role: Role) -> DomainResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "only a {role} may do this, {} is a {}",
                self.id, self.role
            )))
        }
    }

    /// Shorthand for `require_role(Role::Vendor)`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` if the actor is not a vendor.
    pub fn require_vendor(&self) -> DomainResult<()> {
        self.require_role(Role::Vendor)
    }

    /// Shorthand for `require_role(Role::Supplier)`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` if the actor is not a supplier.
    pub fn require_supplier(&self) -> DomainResult<()> {
        self.require_role(Role::Supplier)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.role, self.id)
    }
}
