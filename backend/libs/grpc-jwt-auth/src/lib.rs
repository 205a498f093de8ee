//! JWT role-based authentication for tonic services
//!
//! ## Core Components
//!
//! - **JwtManager**: issues and verifies HMAC-signed access tokens
//! - **RolePolicy**: static table of method path -> permitted roles
//! - **AuthLayer**: tower layer that enforces the policy on inbound calls
//! - **TokenRefresher / AuthInterceptor**: keep a client token fresh and
//!   attach it to allow-listed outgoing calls
//! - **UserClaimsExt**: read verified claims inside handlers
//!
//! ## Server Side
//!
//! ```rust,no_run
//! use grpc_jwt_auth::{AuthLayer, JwtManager, RolePolicy};
//! use std::sync::Arc;
//!
//! const POLICY: &[(&str, &[&str])] = &[
//!     ("/catalog.v1.CatalogService/CreateDevice", &["admin"]),
//!     ("/catalog.v1.CatalogService/RateDevice", &["admin", "user"]),
//! ];
//!
//! let jwt = Arc::new(JwtManager::new("secret", chrono::Duration::minutes(15)));
//! let layer = AuthLayer::new(jwt, RolePolicy::from_table(POLICY));
//! // tonic::transport::Server::builder().layer(layer).add_service(svc)
//! ```
//!
//! ## Client Side
//!
//! ```rust,no_run
//! use grpc_jwt_auth::{RefreshConfig, TokenRefresher, TokenSource};
//!
//! # async fn example(source: impl TokenSource) -> Result<(), Box<dyn std::error::Error>> {
//! let refresher = TokenRefresher::start(
//!     source,
//!     ["/catalog.v1.CatalogService/CreateDevice"],
//!     RefreshConfig::default(),
//! )
//! .await?;
//! let interceptor = refresher.interceptor();
//! // CatalogServiceClient::with_interceptor(channel, interceptor)
//! refresher.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Outcomes
//!
//! - Method not in the policy = passes, no token needed
//! - No token = `Status::unauthenticated`
//! - Invalid or expired token = `Status::unauthenticated`
//! - Role not listed = `Status::permission_denied`

mod claims;
mod client;
mod error;
mod extensions;
mod jwt;
mod policy;
mod server;

pub use claims::UserClaims;
pub use client::{AuthInterceptor, RefreshConfig, TokenRefresher, TokenSource};
pub use error::{AuthError, Result};
pub use extensions::UserClaimsExt;
pub use jwt::JwtManager;
pub use policy::RolePolicy;
pub use server::{AuthLayer, AuthMiddleware, Authorizer, AUTHORIZATION_KEY};

// Re-export tonic Status for convenience
pub use tonic::Status;
