use std::path::PathBuf;

/// Metadata of a stored image; the bytes live at `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: String,
    pub device_id: String,
    pub image_type: String,
    pub path: PathBuf,
}
