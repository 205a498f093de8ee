//! Store layer for catalog-service
//!
//! Each store is a trait with an in-memory implementation behind one coarse
//! lock. Handlers hold `Arc<dyn ...Store>` and never see store internals.
//!
//! - `device_store`: device records, filter search
//! - `image_store`: image bytes on disk, metadata in memory
//! - `rating_store`: per-device rating aggregates
//! - `user_store`: login accounts

pub mod device_store;
pub mod image_store;
pub mod rating_store;
pub mod user_store;

pub use device_store::{DeviceStore, InMemoryDeviceStore};
pub use image_store::{DiskImageStore, ImageStore};
pub use rating_store::{InMemoryRatingStore, RatingStore};
pub use user_store::{seed_demo_users, InMemoryUserStore, UserStore};
