#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tower::Layer;

use shortlink::api::middleware::rate_limit::RateLimit;
use shortlink::domain::location_event::LocateVisit;
use shortlink::infrastructure::cache::NullCache;
use shortlink::infrastructure::persistence::Repositories;
use shortlink::infrastructure::url_validator::NoopUrlValidator;
use shortlink::state::{AppState, StateOptions};
use shortlink::utils::code_generator::Alphabet;

use std::sync::Arc;

pub const TEST_SECRET: &str = "test-signing-secret";
pub const SHORT_DOMAIN: &str = "s.test";
pub const PEER_ADDR: &str = "203.0.113.7:12345";

/// Puts a fixed `ConnectInfo` on every request, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = PEER_ADDR.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

pub fn test_rate_limit() -> RateLimit {
    RateLimit {
        refill_seconds: 1,
        burst: 10_000,
        behind_proxy: false,
    }
}

/// State over a fresh in-memory store.
pub fn create_test_state() -> (AppState, mpsc::Receiver<LocateVisit>) {
    let (tx, rx) = mpsc::channel(100);

    let options = StateOptions {
        alphabet: Alphabet::default(),
        short_domain_schema: "https".to_string(),
        short_domain_host: SHORT_DOMAIN.to_string(),
        token_signing_secret: TEST_SECRET.to_string(),
        behind_proxy: false,
    };

    let state = AppState::new(
        &Repositories::in_memory(),
        options,
        Arc::new(NoopUrlValidator),
        Arc::new(NullCache::new()),
        tx,
    );

    (state, rx)
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub locate_rx: mpsc::Receiver<LocateVisit>,
    /// A valid key for authenticated routes.
    pub api_key: String,
}

/// Full application router with every middleware, backed by the in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_limit(test_rate_limit()).await
}

pub async fn spawn_app_with_limit(limit: RateLimit) -> TestApp {
    let (state, locate_rx) = create_test_state();
    let (api_key, _) = state.api_key_service.create(None).await.unwrap();

    let app = shortlink::routes::router(state.clone(), limit)
        .unwrap()
        .layer(MockConnectInfoLayer);
    let server = TestServer::new(app).unwrap();

    TestApp {
        server,
        state,
        locate_rx,
        api_key,
    }
}
