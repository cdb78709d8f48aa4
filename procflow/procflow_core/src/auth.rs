//! Caller identity and access roles.
//!
//! Identity and role resolution live outside this engine. The engine only
//! consumes them through two narrow traits: [`IdentityProvider`] answers
//! "who is calling" and [`RoleDirectory`] answers "may this user administer
//! process schemas". [`AccessGuard`] combines both into the single check
//! applied in front of every mutating operation.

use crate::error::{Error, Result};
use crate::id::UserId;
use std::collections::HashMap;
use std::sync::Arc;

/// The resolved caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
}

/// Administrative roles a user may hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessRoles {
    pub is_admin: bool,
    pub is_service_admin: bool,
}

impl AccessRoles {
    /// Roles of a full administrator.
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            is_service_admin: false,
        }
    }

    /// Whether these roles allow editing process schemas.
    pub fn can_edit_schemas(&self) -> bool {
        self.is_admin || self.is_service_admin
    }
}

/// Resolves the identity of the current caller.
pub trait IdentityProvider: Send + Sync {
    /// Resolve the caller.
    ///
    /// When `required` is true and nobody is signed in, this fails with
    /// [`Error::Unauthenticated`]. When `required` is false it may return
    /// `Ok(None)`.
    fn authenticate(&self, required: bool) -> Result<Option<Caller>>;
}

/// Looks up the administrative roles of a user.
pub trait RoleDirectory: Send + Sync {
    fn roles(&self, user_id: &UserId) -> Result<AccessRoles>;
}

/// Identity provider that always answers with the same caller (or nobody).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    caller: Option<Caller>,
}

impl StaticIdentity {
    /// A provider with a signed-in user.
    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            caller: Some(Caller { user_id }),
        }
    }

    /// A provider with nobody signed in.
    pub fn anonymous() -> Self {
        Self { caller: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn authenticate(&self, required: bool) -> Result<Option<Caller>> {
        match self.caller {
            Some(caller) => Ok(Some(caller)),
            None if required => Err(Error::Unauthenticated),
            None => Ok(None),
        }
    }
}

/// Role directory backed by a fixed map. Unknown users hold no roles.
#[derive(Debug, Clone, Default)]
pub struct StaticRoles {
    roles: HashMap<UserId, AccessRoles>,
}

impl StaticRoles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant roles to a user.
    pub fn with(mut self, user_id: UserId, roles: AccessRoles) -> Self {
        self.roles.insert(user_id, roles);
        self
    }
}

impl RoleDirectory for StaticRoles {
    fn roles(&self, user_id: &UserId) -> Result<AccessRoles> {
        Ok(self.roles.get(user_id).copied().unwrap_or_default())
    }
}

/// The single authorization interceptor for schema operations.
#[derive(Clone)]
pub struct AccessGuard {
    identity: Arc<dyn IdentityProvider>,
    roles: Arc<dyn RoleDirectory>,
    require_auth_for_reads: bool,
}

impl AccessGuard {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        roles: Arc<dyn RoleDirectory>,
        require_auth_for_reads: bool,
    ) -> Self {
        Self {
            identity,
            roles,
            require_auth_for_reads,
        }
    }

    /// A guard that lets a single administrator do everything.
    pub fn single_admin(user_id: UserId) -> Self {
        Self::new(
            Arc::new(StaticIdentity::signed_in(user_id)),
            Arc::new(StaticRoles::new().with(user_id, AccessRoles::admin())),
            false,
        )
    }

    /// Check that the caller may mutate process schemas.
    pub fn authorize_write(&self, operation: &str) -> Result<Caller> {
        let caller = self
            .identity
            .authenticate(true)?
            .ok_or(Error::Unauthenticated)?;

        let roles = self.roles.roles(&caller.user_id)?;
        if !roles.can_edit_schemas() {
            tracing::debug!(user = %caller.user_id, operation, "write rejected");
            return Err(Error::Forbidden(format!(
                "{} requires an administrator or service administrator",
                operation
            )));
        }

        Ok(caller)
    }

    /// Check that the caller may read process schemas.
    pub fn authorize_read(&self) -> Result<Option<Caller>> {
        self.identity.authenticate(self.require_auth_for_reads)
    }
}
