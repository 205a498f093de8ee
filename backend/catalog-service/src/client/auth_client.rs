use crate::proto::catalog::v1::auth_service_client::AuthServiceClient;
use crate::proto::catalog::v1::LoginRequest;
use async_trait::async_trait;
use grpc_jwt_auth::{AuthError, TokenSource};
use std::time::Duration;
use tonic::transport::Channel;
use tonic::Request;
use tracing::debug;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Logs in with fixed credentials through the AuthService
#[derive(Clone)]
pub struct AuthClient {
    client: AuthServiceClient<Channel>,
    username: String,
    password: String,
}

impl AuthClient {
    pub fn new(channel: Channel, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client: AuthServiceClient::new(channel),
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl TokenSource for AuthClient {
    async fn login(&self) -> grpc_jwt_auth::Result<String> {
        let mut request = Request::new(LoginRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        });
        request.set_timeout(LOGIN_TIMEOUT);

        let mut client = self.client.clone();
        let response = client
            .login(request)
            .await
            .map_err(|status| AuthError::LoginFailed(status.message().to_string()))?;

        debug!(username = %self.username, "Logged in");
        Ok(response.into_inner().access_token)
    }
}
