//! Service assembly: stores, handlers, auth layer and router

use crate::config::Settings;
use crate::db::{
    seed_demo_users, DeviceStore, DiskImageStore, ImageStore, InMemoryDeviceStore,
    InMemoryRatingStore, InMemoryUserStore, RatingStore, UserStore,
};
use crate::error::{CatalogError, Result};
use crate::grpc::{policy, AuthServiceImpl, CatalogServiceImpl};
use crate::proto::catalog::v1::auth_service_server::AuthServiceServer;
use crate::proto::catalog::v1::catalog_service_server::CatalogServiceServer;
use grpc_jwt_auth::{AuthLayer, JwtManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::server::Router;
use tonic::transport::Server;
use tower::layer::util::{Identity, Stack};
use tracing::info;

pub type CatalogRouter = Router<Stack<AuthLayer, Identity>>;

/// Everything the server needs, built once at startup
#[derive(Clone)]
pub struct App {
    pub devices: Arc<dyn DeviceStore>,
    pub images: Arc<dyn ImageStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub users: Arc<dyn UserStore>,
    pub jwt: Arc<JwtManager>,
}

impl App {
    /// In-memory stores with images written under `image_folder`
    ///
    /// The folder is created if missing.
    pub fn new(
        image_folder: impl Into<PathBuf>,
        jwt_secret: &str,
        token_duration: Duration,
    ) -> Result<Self> {
        let image_folder = image_folder.into();
        std::fs::create_dir_all(&image_folder)?;

        let token_duration = chrono::Duration::from_std(token_duration)
            .map_err(|e| CatalogError::Internal(format!("invalid token duration: {}", e)))?;

        Ok(Self {
            devices: Arc::new(InMemoryDeviceStore::new()),
            images: Arc::new(DiskImageStore::new(image_folder)),
            ratings: Arc::new(InMemoryRatingStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            jwt: Arc::new(JwtManager::new(jwt_secret, token_duration)),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let app = Self::new(
            &settings.images.folder,
            &settings.jwt.secret,
            settings.jwt.token_duration(),
        )?;
        if settings.seed_demo_users {
            app.seed_demo_users()?;
        }
        Ok(app)
    }

    pub fn seed_demo_users(&self) -> Result<()> {
        seed_demo_users(self.users.as_ref())
    }

    /// CatalogService and AuthService behind the role-policy auth layer
    pub fn router(&self) -> CatalogRouter {
        let catalog = CatalogServiceImpl::new(
            self.devices.clone(),
            self.images.clone(),
            self.ratings.clone(),
        );
        let auth = AuthServiceImpl::new(self.users.clone(), self.jwt.clone());
        info!(
            covered_methods = policy::ACCESSIBLE_ROLES.len(),
            "Role policy installed"
        );

        Server::builder()
            .layer(AuthLayer::new(self.jwt.clone(), policy::role_policy()))
            .add_service(CatalogServiceServer::new(catalog))
            .add_service(AuthServiceServer::new(auth))
    }
}
