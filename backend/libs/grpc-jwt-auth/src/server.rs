//! Server-side auth layer
//!
//! A tower layer placed in front of the tonic router. It runs once per call,
//! before the handler is invoked, for unary and streaming methods alike, and
//! decides from the request path and the `authorization` header whether the
//! call may proceed.

use crate::claims::UserClaims;
use crate::error::{AuthError, Result};
use crate::jwt::JwtManager;
use crate::policy::RolePolicy;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::body::BoxBody;
use tonic::codegen::http;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Metadata key carrying the raw access token
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Policy decision for a single call
///
/// - method not in the policy table: pass through, no claims
/// - no token: `AuthError::MissingToken`
/// - token fails verification: `AuthError::InvalidToken`
/// - role not permitted: `AuthError::PermissionDenied`
pub struct Authorizer {
    jwt: Arc<JwtManager>,
    policy: RolePolicy,
}

impl Authorizer {
    pub fn new(jwt: Arc<JwtManager>, policy: RolePolicy) -> Self {
        Self { jwt, policy }
    }

    pub fn authorize(&self, method: &str, token: Option<&str>) -> Result<Option<UserClaims>> {
        let Some(allowed_roles) = self.policy.roles_for(method) else {
            return Ok(None);
        };

        let token = token.ok_or_else(|| {
            warn!(method = %method, "Missing authorization token");
            AuthError::MissingToken
        })?;

        // Tolerate a scheme prefix even though the contract sends the raw token
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        let claims = self.jwt.verify(token).map_err(|e| {
            warn!(method = %method, error = %e, "Authorization token rejected");
            e
        })?;

        if !claims.has_any_role(allowed_roles.iter().map(String::as_str)) {
            warn!(
                method = %method,
                username = %claims.username,
                role = %claims.role,
                "Role not permitted for method"
            );
            return Err(AuthError::PermissionDenied {
                method: method.to_string(),
                role: claims.role,
            });
        }

        debug!(method = %method, username = %claims.username, "Call authorized");
        Ok(Some(claims))
    }
}

/// Tower layer applying [`Authorizer`] to every inbound gRPC call
///
/// ```rust,no_run
/// use grpc_jwt_auth::{AuthLayer, JwtManager, RolePolicy};
/// use std::sync::Arc;
///
/// let jwt = Arc::new(JwtManager::new("secret", chrono::Duration::minutes(15)));
/// let policy = RolePolicy::new().allow("/catalog.v1.CatalogService/CreateDevice", ["admin"]);
/// let layer = AuthLayer::new(jwt, policy);
/// // tonic::transport::Server::builder().layer(layer).add_service(...)
/// ```
#[derive(Clone)]
pub struct AuthLayer {
    authorizer: Arc<Authorizer>,
}

impl AuthLayer {
    pub fn new(jwt: Arc<JwtManager>, policy: RolePolicy) -> Self {
        Self {
            authorizer: Arc::new(Authorizer::new(jwt, policy)),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, service: S) -> Self::Service {
        AuthMiddleware {
            inner: service,
            authorizer: self.authorizer.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    authorizer: Arc<Authorizer>,
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<BoxBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        let decision = {
            let token = req
                .headers()
                .get(AUTHORIZATION_KEY)
                .and_then(|value| value.to_str().ok());
            self.authorizer.authorize(req.uri().path(), token)
        };

        match decision {
            Ok(claims) => {
                if let Some(claims) = claims {
                    req.extensions_mut().insert(claims);
                }
                // The clone that was polled ready handles this call
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move { inner.call(req).await })
            }
            Err(err) => {
                let response = err.to_status().into_http();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
