pub mod analytics;
pub mod attendance_session;
pub mod error;
pub mod identity;
pub mod qr;

#[cfg(test)]
pub(crate) mod test_support;

/// Largest `skip`/`limit` the SQLite binder accepts (it binds them as `i64`).
pub const MAX_ROW_COUNT: u64 = i64::MAX as u64;

pub use error::{ServiceError, ServiceResult};
pub use identity::Caller;
