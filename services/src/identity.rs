use crate::error::{ServiceError, ServiceResult};
use db::models::class;

pub use db::models::user::Role;

/// A verified caller: who they are and the role their credential carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub role: Role,
}

impl Caller {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin, or the faculty member the class is assigned to.
    pub fn can_manage(&self, class: &class::Model) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Faculty => class.assigned_to == self.id,
            Role::Student => false,
        }
    }

    pub fn ensure_can_manage(&self, class: &class::Model) -> ServiceResult<()> {
        if self.can_manage(class) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "You do not have access to class {}",
                class.code
            )))
        }
    }

    /// Admin or faculty; students never see staff listings.
    pub fn ensure_staff(&self) -> ServiceResult<()> {
        match self.role {
            Role::Admin | Role::Faculty => Ok(()),
            Role::Student => Err(ServiceError::Forbidden(
                "Only faculty or admin can perform this action".into(),
            )),
        }
    }
}
