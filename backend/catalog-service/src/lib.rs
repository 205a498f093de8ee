//! Catalog Service Library
//!
//! Device catalog over gRPC: create, filter-search, chunked image upload and
//! streaming ratings, gated by role-based JWT auth.
//!
//! ## Modules
//!
//! - `app`: store wiring and the tonic router
//! - `client`: Login token source and CatalogService client wrapper
//! - `config`: Service configuration
//! - `context`: Per-call cancellation and deadline
//! - `db`: Store traits and in-memory implementations
//! - `error`: Error types
//! - `grpc`: gRPC handlers and the role policy
//! - `models`: Domain behavior on top of the protobuf types
//! - `sample`: Random devices and scores
//! - `security`: Password hashing

pub mod app;
pub mod client;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod grpc;
pub mod models;
pub mod sample;
pub mod security;

// Generated protobuf types
pub mod proto {
    pub mod catalog {
        pub mod v1 {
            tonic::include_proto!("catalog.v1");
        }
    }
}

// Re-export commonly used types
pub use app::App;
pub use error::{CatalogError, Result};
