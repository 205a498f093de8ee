//! Domain models
//!
//! Device, filter and memory types are the generated protobuf messages;
//! this module adds the behavior the stores need on top of them.

pub mod filter;
pub mod image;
pub mod memory;
pub mod rating;
pub mod user;

pub use filter::matches_filter;
pub use image::ImageRecord;
pub use memory::MemoryExt;
pub use rating::Rating;
pub use user::User;
