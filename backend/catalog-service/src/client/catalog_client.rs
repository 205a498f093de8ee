use crate::proto::catalog::v1::catalog_service_client::CatalogServiceClient;
use crate::proto::catalog::v1::upload_image_request::Data;
use crate::proto::catalog::v1::{
    CreateDeviceRequest, Device, Filter, ImageInfo, RateDeviceRequest, RateDeviceResponse,
    SearchDevicesRequest, UploadImageRequest, UploadImageResponse,
};
use anyhow::{Context, Result};
use grpc_jwt_auth::AuthInterceptor;
use std::path::Path;
use std::time::Duration;
use tonic::codegen::InterceptedService;
use tonic::transport::Channel;
use tonic::{Request, Status};
use tracing::{debug, info};

const CALL_TIMEOUT: Duration = Duration::from_secs(5);
const CHUNK_SIZE: usize = 1024;

/// CatalogService client whose calls carry the refresher's token
#[derive(Clone)]
pub struct CatalogClient {
    inner: CatalogServiceClient<InterceptedService<Channel, AuthInterceptor>>,
}

impl CatalogClient {
    pub fn new(channel: Channel, interceptor: AuthInterceptor) -> Self {
        Self {
            inner: CatalogServiceClient::with_interceptor(channel, interceptor),
        }
    }

    fn request<T>(message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(CALL_TIMEOUT);
        request
    }

    pub async fn create_device(&mut self, device: Device) -> std::result::Result<String, Status> {
        let response = self
            .inner
            .create_device(Self::request(CreateDeviceRequest {
                device: Some(device),
            }))
            .await?;
        let id = response.into_inner().id;
        info!(device_id = %id, "Created device");
        Ok(id)
    }

    /// Collect every device the server streams back for `filter`
    pub async fn search_devices(&mut self, filter: Filter) -> std::result::Result<Vec<Device>, Status> {
        let mut stream = self
            .inner
            .search_devices(Self::request(SearchDevicesRequest {
                filter: Some(filter),
            }))
            .await?
            .into_inner();

        let mut devices = Vec::new();
        while let Some(response) = stream.message().await? {
            if let Some(device) = response.device {
                debug!(device_id = %device.id, "Found device");
                devices.push(device);
            }
        }
        Ok(devices)
    }

    /// Upload `data` as an info message followed by 1 KiB chunks
    pub async fn upload_image(
        &mut self,
        device_id: &str,
        image_type: &str,
        data: &[u8],
    ) -> std::result::Result<UploadImageResponse, Status> {
        let mut messages = vec![UploadImageRequest {
            data: Some(Data::Info(ImageInfo {
                device_id: device_id.to_string(),
                image_type: image_type.to_string(),
            })),
        }];
        messages.extend(data.chunks(CHUNK_SIZE).map(|chunk| UploadImageRequest {
            data: Some(Data::ChunkData(chunk.to_vec())),
        }));

        let response = self
            .inner
            .upload_image(Self::request(tokio_stream::iter(messages)))
            .await?
            .into_inner();
        info!(image_id = %response.id, size = response.size, "Uploaded image");
        Ok(response)
    }

    /// Upload a file, using its extension as the image type
    pub async fn upload_image_file(&mut self, device_id: &str, path: &Path) -> Result<UploadImageResponse> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("cannot read image file {}", path.display()))?;
        let image_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        self.upload_image(device_id, &image_type, &data)
            .await
            .context("image upload failed")
    }

    /// Send every rating, returning the running aggregates in request order
    pub async fn rate_devices(
        &mut self,
        ratings: Vec<(String, f64)>,
    ) -> std::result::Result<Vec<RateDeviceResponse>, Status> {
        let requests = ratings
            .into_iter()
            .map(|(device_id, score)| RateDeviceRequest { device_id, score });

        let mut stream = self
            .inner
            .rate_device(Self::request(tokio_stream::iter(requests)))
            .await?
            .into_inner();

        let mut responses = Vec::new();
        while let Some(response) = stream.message().await? {
            debug!(
                device_id = %response.device_id,
                count = response.rated_count,
                average = response.average_score,
                "Rating recorded"
            );
            responses.push(response);
        }
        Ok(responses)
    }
}
