//! AuthService: exchanges username/password for an access token

use crate::db::UserStore;
use crate::proto::catalog::v1::auth_service_server::AuthService;
use crate::proto::catalog::v1::{LoginRequest, LoginResponse};
use grpc_jwt_auth::JwtManager;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{error, info, warn};

const LOGIN_FAILED: &str = "incorrect username/password";

#[derive(Clone)]
pub struct AuthServiceImpl {
    users: Arc<dyn UserStore>,
    jwt: Arc<JwtManager>,
}

impl AuthServiceImpl {
    pub fn new(users: Arc<dyn UserStore>, jwt: Arc<JwtManager>) -> Self {
        Self { users, jwt }
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> std::result::Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        let Some(user) = self.users.find(&req.username)? else {
            warn!(username = %req.username, "Login for unknown user");
            return Err(Status::unauthenticated(LOGIN_FAILED));
        };

        // Argon2 verification is CPU bound
        let candidate = user.clone();
        let password_ok =
            tokio::task::spawn_blocking(move || candidate.is_correct_password(&req.password))
                .await
                .map_err(|e| {
                    error!("Password verification task failed: {}", e);
                    Status::internal("Internal server error")
                })?;

        if !password_ok {
            warn!(username = %user.username, "Login with wrong password");
            return Err(Status::unauthenticated(LOGIN_FAILED));
        }

        let access_token = self.jwt.generate(&user.username, &user.role)?;
        info!(
            username = %user.username,
            role = %user.role,
            expires_in_secs = self.jwt.token_duration().num_seconds(),
            "User logged in"
        );

        Ok(Response::new(LoginResponse { access_token }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed_demo_users, InMemoryUserStore};
    use tonic::Code;

    fn service() -> (AuthServiceImpl, Arc<JwtManager>) {
        let users = Arc::new(InMemoryUserStore::new());
        seed_demo_users(users.as_ref()).unwrap();
        let jwt = Arc::new(JwtManager::new("test-secret", chrono::Duration::minutes(15)));
        (AuthServiceImpl::new(users, jwt.clone()), jwt)
    }

    fn login_request(username: &str, password: &str) -> Request<LoginRequest> {
        Request::new(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn test_login_issues_token_with_role() {
        let (service, jwt) = service();

        let response = service.login(login_request("admin1", "secret")).await.unwrap();
        let claims = jwt.verify(&response.into_inner().access_token).unwrap();
        assert_eq!(claims.username, "admin1");
        assert_eq!(claims.role, "admin");
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let (service, _) = service();

        let wrong_password = service.login(login_request("user1", "nope")).await.unwrap_err();
        let unknown_user = service.login(login_request("ghost", "secret")).await.unwrap_err();

        assert_eq!(wrong_password.code(), Code::Unauthenticated);
        assert_eq!(unknown_user.code(), Code::Unauthenticated);
        assert_eq!(wrong_password.message(), unknown_user.message());
    }
}
