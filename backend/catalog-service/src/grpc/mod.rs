//! gRPC layer for catalog-service
//!
//! Exports:
//! - CatalogServiceImpl: CreateDevice, SearchDevices, UploadImage, RateDevice
//! - AuthServiceImpl: Login
//! - policy: role table shared by the server auth layer and client allow-list

pub mod auth;
pub mod catalog;
pub mod policy;

pub use auth::AuthServiceImpl;
pub use catalog::{CatalogServiceImpl, MAX_IMAGE_SIZE};
