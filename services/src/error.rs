use hmac::digest::InvalidLength;
use sea_orm::DbErr;
use thiserror::Error;

/// Every way a core operation can fail. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Token has expired")]
    Expired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Attendance window is not open yet")]
    WindowNotOpen,

    #[error("Attendance window has closed")]
    WindowClosed,

    #[error("You are not enrolled in this class")]
    NotEnrolled,

    #[error("Attendance already marked for this session")]
    DuplicateMark,

    #[error("QR code does not match the current session challenge")]
    InvalidQr,

    #[error("Database error: {0}")]
    Internal(#[from] DbErr),

    #[error("QR signing failed: {0}")]
    Signing(#[from] InvalidLength),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn class_not_found(code: &str) -> Self {
        Self::NotFound(format!("Class {code} not found"))
    }

    pub fn session_not_found(code: &str) -> Self {
        Self::NotFound(format!("Session {code} not found"))
    }
}
