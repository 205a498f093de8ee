//! CatalogService: device creation, search, image upload and rating
//!
//! Every handler derives a [`CallContext`] from the call metadata and stops
//! with CANCELLED / DEADLINE_EXCEEDED as soon as the caller goes away or the
//! caller's deadline passes. Streaming handlers surface the first error and
//! end the stream.

use crate::context::CallContext;
use crate::db::{DeviceStore, ImageStore, RatingStore};
use crate::error::{CatalogError, Result};
use crate::proto::catalog::v1::catalog_service_server::CatalogService;
use crate::proto::catalog::v1::upload_image_request::Data;
use crate::proto::catalog::v1::{
    CreateDeviceRequest, CreateDeviceResponse, ImageInfo, RateDeviceRequest, RateDeviceResponse,
    SearchDevicesRequest, SearchDevicesResponse, UploadImageRequest, UploadImageResponse,
};
use grpc_jwt_auth::UserClaimsExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info, warn};

/// Largest image accepted by UploadImage (1 MiB)
pub const MAX_IMAGE_SIZE: usize = 1 << 20;

const SEARCH_BUFFER: usize = 16;
const RATE_BUFFER: usize = 16;
const MAX_IMAGE_TYPE_LEN: usize = 10;

#[derive(Clone)]
pub struct CatalogServiceImpl {
    devices: Arc<dyn DeviceStore>,
    images: Arc<dyn ImageStore>,
    ratings: Arc<dyn RatingStore>,
}

impl CatalogServiceImpl {
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        images: Arc<dyn ImageStore>,
        ratings: Arc<dyn RatingStore>,
    ) -> Self {
        Self {
            devices,
            images,
            ratings,
        }
    }

    /// Run store calls on the blocking pool
    ///
    /// The device lock stays held while a search waits on a slow reader, so
    /// store calls never run on async workers.
    async fn with_stores<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CatalogServiceImpl) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = self.clone();
        tokio::task::spawn_blocking(move || f(&service))
            .await
            .map_err(|e| CatalogError::Internal(format!("store task failed: {}", e)))?
    }

    fn require_device(&self, device_id: &str) -> Result<()> {
        match self.devices.find_by_id(device_id)? {
            Some(_) => Ok(()),
            None => Err(CatalogError::Validation(format!(
                "device {} doesn't exist",
                device_id
            ))),
        }
    }
}

#[tonic::async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn create_device(
        &self,
        request: Request<CreateDeviceRequest>,
    ) -> std::result::Result<Response<CreateDeviceResponse>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let created_by = caller(&request);
        let device = request
            .into_inner()
            .device
            .ok_or_else(|| Status::invalid_argument("device is required"))?;

        ctx.check().map_err(|e| {
            warn!(error = %e, "CreateDevice abandoned by caller");
            e
        })?;

        let id = self
            .with_stores(move |service| service.devices.save(device))
            .await
            .map_err(|e| {
                warn!(error = %e, "Cannot save device");
                e
            })?;

        info!(device_id = %id, created_by = %created_by, "Device created");
        Ok(Response::new(CreateDeviceResponse { id }))
    }

    type SearchDevicesStream = ReceiverStream<std::result::Result<SearchDevicesResponse, Status>>;

    async fn search_devices(
        &self,
        request: Request<SearchDevicesRequest>,
    ) -> std::result::Result<Response<Self::SearchDevicesStream>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let filter = request.into_inner().filter.unwrap_or_default();
        debug!(?filter, "SearchDevices");

        let (tx, rx) = mpsc::channel(SEARCH_BUFFER);
        let devices = self.devices.clone();

        tokio::spawn(async move {
            // Dropping the response stream cancels the search
            let watcher = {
                let ctx = ctx.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    tx.closed().await;
                    ctx.cancel();
                })
            };

            let search_tx = tx.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let mut found = 0usize;
                let result = devices.search(&ctx, &filter, &mut |device| {
                    search_tx
                        .blocking_send(Ok(SearchDevicesResponse {
                            device: Some(device),
                        }))
                        .map_err(|_| CatalogError::Cancelled)?;
                    found += 1;
                    Ok(())
                });
                result.map(|()| found)
            })
            .await;
            watcher.abort();

            match outcome {
                Ok(Ok(found)) => info!(found, "Search completed"),
                Ok(Err(e)) => {
                    warn!(error = %e, "Search stopped");
                    let _ = tx.send(Err(e.into())).await;
                }
                Err(e) => {
                    error!("Search task failed: {}", e);
                    let _ = tx.send(Err(Status::internal("Internal server error"))).await;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn upload_image(
        &self,
        request: Request<Streaming<UploadImageRequest>>,
    ) -> std::result::Result<Response<UploadImageResponse>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let uploaded_by = caller(&request);
        let mut stream = request.into_inner();

        // INIT: exactly one info message
        let info = match next_message(&ctx, &mut stream).await? {
            Some(UploadImageRequest {
                data: Some(Data::Info(info)),
            }) => info,
            Some(_) => {
                return Err(Status::invalid_argument(
                    "first upload message must carry image info",
                ))
            }
            None => return Err(Status::invalid_argument("image info is required")),
        };
        let ImageInfo {
            device_id,
            image_type,
        } = info;

        validate_image_type(&image_type)?;
        let lookup_id = device_id.clone();
        self.with_stores(move |service| service.require_device(&lookup_id))
            .await
            .map_err(|e| {
                warn!(device_id = %device_id, error = %e, "Upload rejected");
                e
            })?;
        debug!(device_id = %device_id, image_type = %image_type, "Receiving image");

        // ACCUMULATING
        let mut upload = ImageUpload::new(MAX_IMAGE_SIZE);
        while let Some(message) = next_message(&ctx, &mut stream).await? {
            match message.data {
                Some(Data::ChunkData(chunk)) => upload.push(&chunk).map_err(|e| {
                    warn!(device_id = %device_id, error = %e, "Upload aborted");
                    e
                })?,
                _ => {
                    return Err(Status::invalid_argument(
                        "expected chunk data after image info",
                    ))
                }
            }
        }

        // FINALIZING
        ctx.check()?;
        let size = upload.len();
        let id = self
            .images
            .save(&device_id, &image_type, upload.into_bytes())
            .await
            .map_err(|e| {
                error!(device_id = %device_id, error = %e, "Cannot save image");
                e
            })?;

        info!(
            image_id = %id,
            device_id = %device_id,
            size,
            uploaded_by = %uploaded_by,
            "Image uploaded"
        );
        Ok(Response::new(UploadImageResponse {
            id,
            size: u32::try_from(size).map_err(|_| Status::internal("Internal server error"))?,
        }))
    }

    type RateDeviceStream = ReceiverStream<std::result::Result<RateDeviceResponse, Status>>;

    async fn rate_device(
        &self,
        request: Request<Streaming<RateDeviceRequest>>,
    ) -> std::result::Result<Response<Self::RateDeviceStream>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let rated_by = caller(&request);
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(RATE_BUFFER);
        let service = self.clone();

        tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    biased;
                    err = ctx.cancelled() => Err(Status::from(err)),
                    _ = tx.closed() => {
                        debug!("Rating response stream dropped by caller");
                        break;
                    }
                    message = inbound.message() => message,
                };

                let req = match message {
                    Ok(Some(req)) => req,
                    Ok(None) => {
                        debug!(rated_by = %rated_by, "Rating stream finished by caller");
                        break;
                    }
                    Err(status) => {
                        warn!(code = ?status.code(), "Rating stream interrupted");
                        let _ = tx.send(Err(status)).await;
                        break;
                    }
                };

                let device_id = req.device_id.clone();
                match service.with_stores(move |service| service.rate_one(&req)).await {
                    Ok(response) => {
                        if tx.send(Ok(response)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(device_id = %device_id, error = %e, "Rating rejected");
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

impl CatalogServiceImpl {
    fn rate_one(&self, req: &RateDeviceRequest) -> Result<RateDeviceResponse> {
        validate_score(req.score)?;
        self.require_device(&req.device_id)?;

        let rating = self.ratings.add(&req.device_id, req.score)?;
        debug!(device_id = %req.device_id, count = rating.count, "Device rated");

        Ok(RateDeviceResponse {
            device_id: req.device_id.clone(),
            rated_count: rating.count,
            average_score: rating.average(),
        })
    }
}

/// Username from the verified token, or "anonymous" on uncovered calls
fn caller<T>(request: &Request<T>) -> String {
    request
        .user_claims()
        .map(|claims| claims.username.clone())
        .unwrap_or_else(|_| "anonymous".to_string())
}

/// Next inbound message, unless the call is cancelled first
async fn next_message<T>(
    ctx: &CallContext,
    stream: &mut Streaming<T>,
) -> std::result::Result<Option<T>, Status> {
    tokio::select! {
        biased;
        err = ctx.cancelled() => Err(err.into()),
        message = stream.message() => message,
    }
}

/// Extension appended to the image id on disk: empty, or `.` + 1..=10 alphanumerics
fn validate_image_type(image_type: &str) -> Result<()> {
    if image_type.is_empty() {
        return Ok(());
    }

    let valid = image_type
        .strip_prefix('.')
        .is_some_and(|ext| {
            (1..=MAX_IMAGE_TYPE_LEN).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    if valid {
        Ok(())
    } else {
        Err(CatalogError::Validation(format!(
            "invalid image type: {:?}",
            image_type
        )))
    }
}

fn validate_score(score: f64) -> Result<()> {
    if score.is_finite() && (0.0..=10.0).contains(&score) {
        Ok(())
    } else {
        Err(CatalogError::Validation(format!(
            "score must be between 0 and 10, got {}",
            score
        )))
    }
}

/// Chunk accumulator with a hard size ceiling
#[derive(Debug)]
struct ImageUpload {
    data: Vec<u8>,
    limit: usize,
}

impl ImageUpload {
    fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<()> {
        let size = self.data.len() + chunk.len();
        if size > self.limit {
            return Err(CatalogError::ResourceLimit(format!(
                "image is too large: {} > {}",
                size, self.limit
            )));
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DiskImageStore, InMemoryDeviceStore, InMemoryRatingStore};
    use crate::proto::catalog::v1::Filter;
    use crate::sample;
    use tokio_stream::StreamExt;
    use tonic::Code;

    fn service() -> CatalogServiceImpl {
        CatalogServiceImpl::new(
            Arc::new(InMemoryDeviceStore::new()),
            Arc::new(DiskImageStore::new(std::env::temp_dir())),
            Arc::new(InMemoryRatingStore::new()),
        )
    }

    #[tokio::test]
    async fn test_create_device_assigns_id() {
        let service = service();
        let mut device = sample::new_device();
        device.id.clear();

        let response = service
            .create_device(Request::new(CreateDeviceRequest {
                device: Some(device),
            }))
            .await
            .unwrap();
        assert!(uuid::Uuid::parse_str(&response.into_inner().id).is_ok());
    }

    #[tokio::test]
    async fn test_create_device_status_codes() {
        let service = service();
        let device = sample::new_device();

        let request = || {
            Request::new(CreateDeviceRequest {
                device: Some(device.clone()),
            })
        };
        service.create_device(request()).await.unwrap();

        let duplicate = service.create_device(request()).await.unwrap_err();
        assert_eq!(duplicate.code(), Code::AlreadyExists);

        let mut invalid = sample::new_device();
        invalid.id = "invalid-uuid".to_string();
        let status = service
            .create_device(Request::new(CreateDeviceRequest {
                device: Some(invalid),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let missing = service
            .create_device(Request::new(CreateDeviceRequest { device: None }))
            .await
            .unwrap_err();
        assert_eq!(missing.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_create_device_with_expired_deadline() {
        let service = service();
        let mut request = Request::new(CreateDeviceRequest {
            device: Some(sample::new_device()),
        });
        request
            .metadata_mut()
            .insert("grpc-timeout", "0n".parse().unwrap());

        let status = service.create_device(request).await.unwrap_err();
        assert_eq!(status.code(), Code::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_search_devices_with_expired_deadline() {
        let service = service();
        for _ in 0..3 {
            service.devices.save(sample::new_device()).unwrap();
        }
        let mut request = Request::new(SearchDevicesRequest {
            filter: Some(Filter {
                max_price_usd: f64::MAX,
                ..Default::default()
            }),
        });
        request
            .metadata_mut()
            .insert("grpc-timeout", "0n".parse().unwrap());

        let mut stream = service.search_devices(request).await.unwrap().into_inner();
        let first = stream.next().await.unwrap().unwrap_err();
        assert_eq!(first.code(), Code::DeadlineExceeded);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_rate_one() {
        let service = service();
        let device = sample::new_device();
        let id = service.devices.save(device).unwrap();

        let rate = |score| {
            service.rate_one(&RateDeviceRequest {
                device_id: id.clone(),
                score,
            })
        };
        assert_eq!(rate(8.0).unwrap().average_score, 8.0);
        let second = rate(7.5).unwrap();
        assert_eq!(second.rated_count, 2);
        assert_eq!(second.average_score, 7.75);
    }

    #[test]
    fn test_rate_one_rejects_unknown_device_and_bad_score() {
        let service = service();
        let missing = service.rate_one(&RateDeviceRequest {
            device_id: uuid::Uuid::new_v4().to_string(),
            score: 5.0,
        });
        assert!(matches!(missing, Err(CatalogError::Validation(_))));

        let id = service.devices.save(sample::new_device()).unwrap();
        for score in [-1.0, 10.5, f64::NAN, f64::INFINITY] {
            let result = service.rate_one(&RateDeviceRequest {
                device_id: id.clone(),
                score,
            });
            assert!(matches!(result, Err(CatalogError::Validation(_))), "{}", score);
        }
    }

    #[test]
    fn test_validate_image_type() {
        for ok in ["", ".jpg", ".png", ".JPEG", ".webp"] {
            assert!(validate_image_type(ok).is_ok(), "{}", ok);
        }
        for bad in [".", "jpg", "./x", "/../etc", ".tar.gz", ".a/b", ".abcdefghijk"] {
            assert!(validate_image_type(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_image_upload_ceiling() {
        let mut upload = ImageUpload::new(MAX_IMAGE_SIZE);
        upload.push(&vec![0; MAX_IMAGE_SIZE - 1]).unwrap();
        upload.push(&[1]).unwrap();
        assert_eq!(upload.len(), MAX_IMAGE_SIZE);

        let err = upload.push(&[2]).unwrap_err();
        assert!(matches!(err, CatalogError::ResourceLimit(_)));
        assert_eq!(upload.len(), MAX_IMAGE_SIZE);
    }
}
