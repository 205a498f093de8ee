//! Client-side token injection and background refresh
//!
//! [`TokenRefresher`] logs in once on start, caches the token and keeps it
//! fresh from a background task. [`AuthInterceptor`] reads the cached token
//! and attaches it to outgoing calls whose method is on the allow-list.

use crate::error::{AuthError, Result};
use crate::server::AUTHORIZATION_KEY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::{GrpcMethod, Request, Status};
use tracing::{debug, info, warn};

/// Something that can exchange credentials for an access token
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn login(&self) -> Result<String>;
}

/// Two-speed refresh schedule
#[derive(Debug, Clone, Copy)]
pub struct RefreshConfig {
    /// Wait between successful refreshes
    pub refresh_interval: Duration,
    /// Wait after a failed refresh before trying again
    pub retry_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            retry_interval: Duration::from_secs(1),
        }
    }
}

type SharedToken = Arc<RwLock<AsciiMetadataValue>>;

/// Owner of the cached token and the background refresh task
///
/// Dropping the refresher stops the task. Use [`shutdown`](Self::shutdown)
/// to stop it and wait for the task to finish.
pub struct TokenRefresher {
    token: SharedToken,
    auth_methods: Arc<HashSet<String>>,
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl TokenRefresher {
    /// Log in, cache the token and spawn the refresh loop
    ///
    /// `auth_methods` are full method paths (`/package.Service/Method`) that
    /// should carry the token.
    ///
    /// ## Errors
    ///
    /// Fails if the initial login fails. No task is spawned in that case.
    pub async fn start<S, I, M>(source: S, auth_methods: I, config: RefreshConfig) -> Result<Self>
    where
        S: TokenSource,
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        let initial = source.login().await?;
        let token: SharedToken = Arc::new(RwLock::new(to_metadata(initial)?));
        info!("Initial access token acquired");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(refresh_loop(
            Arc::new(source),
            token.clone(),
            config,
            shutdown_rx,
        ));

        Ok(Self {
            token,
            auth_methods: Arc::new(auth_methods.into_iter().map(Into::into).collect()),
            shutdown_tx,
            handle: Some(handle),
        })
    }

    /// Interceptor sharing this refresher's token
    pub fn interceptor(&self) -> AuthInterceptor {
        AuthInterceptor {
            token: self.token.clone(),
            auth_methods: self.auth_methods.clone(),
        }
    }

    pub fn current_token(&self) -> String {
        self.token
            .read()
            .to_str()
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Stop the refresh loop and wait for it to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Token refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TokenRefresher {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn refresh_loop<S: TokenSource>(
    source: Arc<S>,
    token: SharedToken,
    config: RefreshConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut wait = config.refresh_interval;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                info!("Token refresher shutting down");
                break;
            }
            _ = sleep(wait) => {
                match source.login().await.and_then(to_metadata) {
                    Ok(value) => {
                        *token.write() = value;
                        debug!("Access token refreshed");
                        wait = config.refresh_interval;
                    }
                    Err(e) => {
                        warn!("Token refresh failed, retrying in {:?}: {}", config.retry_interval, e);
                        wait = config.retry_interval;
                    }
                }
            }
        }
    }
}

fn to_metadata(token: String) -> Result<AsciiMetadataValue> {
    AsciiMetadataValue::try_from(token)
        .map_err(|_| AuthError::LoginFailed("access token is not valid metadata".to_string()))
}

/// Attaches the cached token to allow-listed calls
///
/// Relies on the [`GrpcMethod`] extension that tonic-generated clients set
/// on every request.
#[derive(Clone)]
pub struct AuthInterceptor {
    token: SharedToken,
    auth_methods: Arc<HashSet<String>>,
}

impl AuthInterceptor {
    fn needs_auth(&self, method: &GrpcMethod) -> bool {
        let path = format!("/{}/{}", method.service(), method.method());
        self.auth_methods.contains(&path)
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        let decorate = request
            .extensions()
            .get::<GrpcMethod>()
            .is_some_and(|method| self.needs_auth(method));

        if decorate {
            let value = self.token.read().clone();
            request.metadata_mut().insert(AUTHORIZATION_KEY, value);
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn login(&self) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("token-{}", n))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl TokenSource for FailingSource {
        async fn login(&self) -> Result<String> {
            Err(AuthError::LoginFailed("incorrect username/password".into()))
        }
    }

    /// Fails the second and third logins
    struct FlakySource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TokenSource for FlakySource {
        async fn login(&self) -> Result<String> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                1 | 2 => Err(AuthError::LoginFailed("auth service unavailable".into())),
                n => Ok(format!("t{}", n)),
            }
        }
    }

    fn request_for(service: &'static str, method: &'static str) -> Request<()> {
        let mut request = Request::new(());
        request
            .extensions_mut()
            .insert(GrpcMethod::new(service, method));
        request
    }

    #[tokio::test]
    async fn test_start_fails_when_initial_login_fails() {
        let result = TokenRefresher::start(FailingSource, ["/pkg.Svc/Write"], RefreshConfig::default()).await;
        assert!(matches!(result, Err(AuthError::LoginFailed(_))));
    }

    #[tokio::test]
    async fn test_interceptor_decorates_allow_listed_methods_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let refresher = TokenRefresher::start(
            CountingSource { calls },
            ["/pkg.Svc/Write"],
            RefreshConfig::default(),
        )
        .await
        .unwrap();
        let mut interceptor = refresher.interceptor();

        let request = interceptor.call(request_for("pkg.Svc", "Write")).unwrap();
        let value = request.metadata().get(AUTHORIZATION_KEY).unwrap();
        assert_eq!(value.to_str().unwrap(), "token-0");

        let request = interceptor.call(request_for("pkg.Svc", "Read")).unwrap();
        assert!(request.metadata().get(AUTHORIZATION_KEY).is_none());

        let request = interceptor.call(Request::new(())).unwrap();
        assert!(request.metadata().get(AUTHORIZATION_KEY).is_none());

        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_cached_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = RefreshConfig {
            refresh_interval: Duration::from_secs(30),
            retry_interval: Duration::from_secs(1),
        };
        let refresher = TokenRefresher::start(
            CountingSource { calls: calls.clone() },
            Vec::<String>::new(),
            config,
        )
        .await
        .unwrap();
        assert_eq!(refresher.current_token(), "token-0");

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refresher.current_token(), "token-1");

        refresher.shutdown().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_retries_quickly_then_slows_down() {
        let calls = Arc::new(AtomicUsize::new(0));
        let refresher = TokenRefresher::start(
            FlakySource { calls: calls.clone() },
            Vec::<String>::new(),
            RefreshConfig::default(),
        )
        .await
        .unwrap();
        let start = tokio::time::Instant::now();
        let at = |secs: f64| tokio::time::sleep_until(start + Duration::from_secs_f64(secs));

        at(30.5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refresher.current_token(), "t0");

        at(31.5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        at(32.5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(refresher.current_token(), "t3");

        // Back on the normal interval
        at(42.5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        at(62.5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(refresher.current_token(), "t4");

        refresher.shutdown().await;
    }
}
