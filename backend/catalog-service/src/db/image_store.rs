use crate::error::Result;
use crate::models::ImageRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// Storage for uploaded device images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `data` and return the new image id
    ///
    /// `image_type` is the file extension including its leading dot. It is
    /// appended to the id verbatim, so callers validate it first.
    async fn save(&self, device_id: &str, image_type: &str, data: Vec<u8>) -> Result<String>;

    async fn find(&self, id: &str) -> Result<Option<ImageRecord>>;
}

/// Writes image bytes to `<folder>/<id><image_type>`; metadata stays in memory
#[derive(Debug)]
pub struct DiskImageStore {
    folder: PathBuf,
    images: Mutex<HashMap<String, ImageRecord>>,
}

impl DiskImageStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            images: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, device_id: &str, image_type: &str, data: Vec<u8>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let path = self.folder.join(format!("{}{}", id, image_type));

        tokio::fs::write(&path, &data).await?;

        let record = ImageRecord {
            id: id.clone(),
            device_id: device_id.to_string(),
            image_type: image_type.to_string(),
            path,
        };
        self.images.lock().insert(id.clone(), record);

        debug!(image_id = %id, device_id = %device_id, size = data.len(), "Image saved");
        Ok(id)
    }

    async fn find(&self, id: &str) -> Result<Option<ImageRecord>> {
        Ok(self.images.lock().get(id).cloned())
    }
}
