//! Client helpers for catalog-service
//!
//! - `auth_client`: Login RPC as a `TokenSource` for the token refresher
//! - `catalog_client`: typed wrapper over the CatalogService RPCs

pub mod auth_client;
pub mod catalog_client;

pub use auth_client::AuthClient;
pub use catalog_client::CatalogClient;
