//! Request extension trait for reading verified claims in handlers

use crate::claims::UserClaims;
use tonic::{Request, Status};

/// Access to the claims the server auth layer stored on a request
///
/// Claims are only present for policy-covered methods. Handlers of uncovered
/// methods see `Status::unauthenticated` from [`user_claims`](Self::user_claims).
///
/// ```rust,no_run
/// use grpc_jwt_auth::UserClaimsExt;
/// use tonic::{Request, Response, Status};
///
/// async fn rate(request: Request<()>) -> Result<Response<()>, Status> {
///     let claims = request.user_claims()?;
///     tracing::info!(username = %claims.username, "rating");
///     Ok(Response::new(()))
/// }
/// ```
pub trait UserClaimsExt {
    /// Claims stored by [`AuthLayer`](crate::AuthLayer)
    ///
    /// ## Errors
    ///
    /// `Status::unauthenticated` when no claims were stored.
    fn user_claims(&self) -> Result<&UserClaims, Status>;
}

impl<T> UserClaimsExt for Request<T> {
    fn user_claims(&self) -> Result<&UserClaims, Status> {
        self.extensions()
            .get::<UserClaims>()
            .ok_or_else(|| Status::unauthenticated("no authenticated user on this call"))
    }
}
