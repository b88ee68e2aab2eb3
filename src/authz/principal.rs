use uuid::Uuid;

use crate::models::user::Role;

/// Principal represents the authenticated actor of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn employee(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Employee)
    }

    pub fn manager(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Manager)
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    pub fn owns(&self, ctx: &ResourceContext) -> bool {
        ctx.owner_id == Some(self.user_id)
    }
}

/// The resource an action targets. Collection-level actions use an empty context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceContext {
    pub resource_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
}

impl ResourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(report_id: Uuid, owner_id: Uuid) -> Self {
        Self {
            resource_id: Some(report_id),
            owner_id: Some(owner_id),
        }
    }
}
