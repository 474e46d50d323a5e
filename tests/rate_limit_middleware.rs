mod common;

use std::net::SocketAddr;

fn limited_config(requests: u32) -> common::Config {
    common::Config {
        rate_limit_requests: requests,
        ..common::test_config()
    }
}

#[tokio::test]
async fn test_requests_within_limit_carry_headers() {
    let app = common::spawn_app_with(limited_config(3));

    let response = app.server.get("/api/links/missing").await;

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.header("x-ratelimit-limit"), "3");
    assert_eq!(response.header("x-ratelimit-remaining"), "2");
}

#[tokio::test]
async fn test_exceeding_limit_returns_429() {
    let app = common::spawn_app_with(limited_config(2));

    assert_eq!(app.server.get("/api/links/a").await.status_code(), 404);
    assert_eq!(app.server.get("/api/links/a").await.status_code(), 404);

    let response = app.server.get("/api/links/a").await;

    assert_eq!(response.status_code(), 429);
    assert_eq!(response.header("x-ratelimit-remaining"), "0");

    let retry_after: u64 = response
        .header("retry-after")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "rate_limit_exceeded");
}

#[tokio::test]
async fn test_rejected_requests_do_not_reach_handlers() {
    let app = common::spawn_app_with(limited_config(1));
    common::create_test_link(&app.repository, "limited", "https://example.com").await;

    assert_eq!(app.server.get("/limited").await.status_code(), 307);
    assert_eq!(app.server.get("/limited").await.status_code(), 429);

    // Only the admitted redirect queued a click.
    assert_eq!(app.state.click_sender.capacity(), 99);
}

#[tokio::test]
async fn test_excluded_path_bypasses_limiter() {
    let app = common::spawn_app_with(limited_config(1));

    for _ in 0..5 {
        let response = app.server.get("/health").await;
        assert_eq!(response.status_code(), 200);
        assert!(response.maybe_header("x-ratelimit-limit").is_none());
    }

    assert!(app.state.rate_limiter.is_empty());
}

#[tokio::test]
async fn test_api_keys_have_separate_buckets() {
    let app = common::spawn_app_with(limited_config(1));

    let first = app
        .server
        .get("/api/links/a")
        .add_header("x-api-key", "key-one")
        .await;
    let second = app
        .server
        .get("/api/links/a")
        .add_header("x-api-key", "key-two")
        .await;
    let repeat = app
        .server
        .get("/api/links/a")
        .add_header("x-api-key", "key-one")
        .await;

    assert_eq!(first.status_code(), 404);
    assert_eq!(second.status_code(), 404);
    assert_eq!(repeat.status_code(), 429);
}

#[tokio::test]
async fn test_api_key_bucket_is_separate_from_ip() {
    let app = common::spawn_app_with(limited_config(1));

    assert_eq!(app.server.get("/api/links/a").await.status_code(), 404);

    let with_key = app
        .server
        .get("/api/links/a")
        .add_header("x-api-key", "key-one")
        .await;
    assert_eq!(with_key.status_code(), 404);
}

#[tokio::test]
async fn test_forwarded_for_ignored_without_proxy() {
    let app = common::spawn_app_with(limited_config(1));

    app.server
        .get("/api/links/a")
        .add_header("x-forwarded-for", "203.0.113.1")
        .await;
    let response = app
        .server
        .get("/api/links/a")
        .add_header("x-forwarded-for", "203.0.113.2")
        .await;

    // Both requests share the peer address bucket.
    assert_eq!(response.status_code(), 429);
}

#[tokio::test]
async fn test_forwarded_for_used_behind_proxy() {
    let config = common::Config {
        behind_proxy: true,
        ..limited_config(1)
    };
    let peer: SocketAddr = "10.0.0.1:40000".parse().unwrap();
    let app = common::spawn_app_from(config, peer);

    let first = app
        .server
        .get("/api/links/a")
        .add_header("x-forwarded-for", "203.0.113.1")
        .await;
    let second = app
        .server
        .get("/api/links/a")
        .add_header("x-forwarded-for", "203.0.113.2, 10.0.0.1")
        .await;

    assert_eq!(first.status_code(), 404);
    assert_eq!(second.status_code(), 404);
}
