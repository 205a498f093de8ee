use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    #[error("Request is cancelled")]
    Cancelled,

    #[error("Deadline is exceeded")]
    DeadlineExceeded,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            CatalogError::Validation(msg) => Status::new(Code::InvalidArgument, msg.clone()),
            CatalogError::AlreadyExists(msg) => Status::new(Code::AlreadyExists, msg.clone()),
            CatalogError::ResourceLimit(msg) => Status::new(Code::ResourceExhausted, msg.clone()),
            CatalogError::Cancelled => Status::new(Code::Cancelled, "request is cancelled"),
            CatalogError::DeadlineExceeded => {
                Status::new(Code::DeadlineExceeded, "deadline is exceeded")
            }
            // Details stay in the server log
            CatalogError::Io(_) | CatalogError::Internal(_) => {
                Status::new(Code::Internal, "Internal server error")
            }
        }
    }
}

impl From<CatalogError> for Status {
    fn from(err: CatalogError) -> Self {
        err.to_status()
    }
}
