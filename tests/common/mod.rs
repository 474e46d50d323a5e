#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;
use url_shortener_core::domain::click_event::ClickEvent;
use url_shortener_core::domain::entities::{Link, NewLink};
use url_shortener_core::domain::repositories::LinkRepository;
use url_shortener_core::infrastructure::persistence::InMemoryLinkRepository;
use url_shortener_core::routes::router;
use url_shortener_core::server::build_state;
use url_shortener_core::state::AppState;

pub use url_shortener_core::config::Config;

pub const BASE_URL: &str = "https://s.example.com";

/// Injects a fixed peer address, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
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
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}

pub fn test_config() -> Config {
    Config {
        base_url: BASE_URL.to_string(),
        click_queue_capacity: 100,
        rate_limit_requests: 1000,
        ..Config::default()
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub repository: Arc<InMemoryLinkRepository>,
    pub clicks: mpsc::Receiver<ClickEvent>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: Config) -> TestApp {
    spawn_app_from(config, "127.0.0.1:12345".parse().unwrap())
}

pub fn spawn_app_from(config: Config, peer: SocketAddr) -> TestApp {
    let repository = Arc::new(InMemoryLinkRepository::new());
    let (state, clicks) = build_state(&config, repository.clone());

    let app = router(state.clone()).layer(MockConnectInfoLayer(peer));
    let server = TestServer::new(app).unwrap();

    TestApp {
        server,
        state,
        repository,
        clicks,
    }
}

pub async fn create_test_link(repo: &InMemoryLinkRepository, code: &str, url: &str) -> Link {
    create_link_expiring(repo, code, url, None).await
}

pub async fn create_link_expiring(
    repo: &InMemoryLinkRepository,
    code: &str,
    url: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Link {
    repo.create(NewLink {
        code: code.to_string(),
        long_url: url.to_string(),
        expires_at,
    })
    .await
    .unwrap()
}

pub async fn create_expired_link(repo: &InMemoryLinkRepository, code: &str, url: &str) -> Link {
    create_link_expiring(
        repo,
        code,
        url,
        Some(Utc::now() - chrono::Duration::hours(1)),
    )
    .await
}
