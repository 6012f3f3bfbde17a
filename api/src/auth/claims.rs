use db::models::user::Role;
use serde::{Deserialize, Serialize};
use services::Caller;

/// JWT payload issued at login.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Internal user id.
    pub sub: i64,
    /// Roll / username.
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn caller(&self) -> Caller {
        Caller::new(self.0.sub, self.0.role)
    }
}
