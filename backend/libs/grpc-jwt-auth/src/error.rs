//! Error types for token issuance, verification and call authorization

use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization token is not provided")]
    MissingToken,

    #[error("authorization token is invalid: {0}")]
    InvalidToken(String),

    #[error("no permission to access {method} with role {role}")]
    PermissionDenied { method: String, role: String },

    #[error("cannot generate access token: {0}")]
    TokenGeneration(String),

    #[error("login failed: {0}")]
    LoginFailed(String),
}

impl AuthError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            AuthError::MissingToken => {
                Status::new(Code::Unauthenticated, "authorization token is not provided")
            }
            // Verification details stay in the server log
            AuthError::InvalidToken(_) => {
                Status::new(Code::Unauthenticated, "authorization token is invalid")
            }
            AuthError::PermissionDenied { .. } => {
                Status::new(Code::PermissionDenied, "no permission to access this RPC")
            }
            AuthError::LoginFailed(msg) => Status::new(Code::Unauthenticated, msg.clone()),
            AuthError::TokenGeneration(_) => {
                Status::new(Code::Internal, "cannot generate access token")
            }
        }
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        err.to_status()
    }
}
