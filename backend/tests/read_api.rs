mod mock_exchange;

use std::sync::Arc;

use warp::Filter;
use warp::http::StatusCode;

use activity_backend::activity::ActivityLog;
use activity_backend::api;
use activity_backend::market::manager::MarketManager;
use activity_backend::market::types::Market;
use mock_exchange::{MemoryRepository, MockExchange, manager};

const NOW: u64 = 1_700_000_000_000;

fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

async fn markets_with_one_spot_event() -> (Arc<MarketManager>, Arc<MarketManager>) {
    let exchange = MockExchange::new();
    exchange.list(Market::Spot, &["ETHUSDT"]);
    let repo = MemoryRepository::new();

    let spot = manager(Market::Spot, exchange.clone(), repo.clone());
    let futures = manager(Market::Futures, exchange.clone(), repo);

    spot.refresh_symbols().await.unwrap();
    exchange.set_price(Market::Spot, "ETHUSDT", 3000.0, NOW);
    spot.tick(NOW).await.unwrap();
    exchange.set_price(Market::Spot, "ETHUSDT", 2900.0, NOW);
    spot.tick(NOW + 10_000).await.unwrap();

    (spot, futures)
}

#[tokio::test]
async fn spot_endpoint_serves_log_with_cors() {
    let (spot, futures) = markets_with_one_spot_event().await;
    let routes = api::routes(spot, futures, local_client());

    let res = warp::test::request().path("/spot").reply(&routes).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        res.headers()["access-control-allow-methods"],
        "GET, HEAD, OPTIONS"
    );
    assert_eq!(res.headers()["access-control-allow-headers"], "*");

    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(
        body,
        serde_json::json!([{
            "symbol": "ETH",
            "oldPrice": 3000.0,
            "newPrice": 2900.0,
            "change": -3.33,
            "time": NOW + 10_000
        }])
    );
}

#[tokio::test]
async fn preflight_is_answered_with_cors_headers() {
    let (spot, futures) = markets_with_one_spot_event().await;
    let routes = api::routes(spot, futures, local_client());

    for path in ["/spot", "/futures", "/logo"] {
        let res = warp::test::request()
            .method("OPTIONS")
            .path(path)
            .header("origin", "https://dashboard.example")
            .header("access-control-request-method", "GET")
            .reply(&routes)
            .await;

        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            res.headers()["access-control-allow-methods"],
            "GET, HEAD, OPTIONS"
        );
        assert!(res.body().is_empty());
    }
}

#[tokio::test]
async fn head_is_accepted_like_get() {
    let (spot, futures) = markets_with_one_spot_event().await;
    let routes = api::routes(spot, futures, local_client());

    let res = warp::test::request()
        .method("HEAD")
        .path("/")
        .reply(&routes)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn never_synced_market_returns_empty_list() {
    let (spot, futures) = markets_with_one_spot_event().await;
    let routes = api::routes(spot, futures, local_client());

    let res = warp::test::request().path("/futures").reply(&routes).await;

    assert_eq!(res.status(), StatusCode::OK);
    let log: ActivityLog = serde_json::from_slice(res.body()).unwrap();
    assert!(log.is_empty());
}

#[tokio::test]
async fn logo_requires_url() {
    let (spot, futures) = markets_with_one_spot_event().await;
    let routes = api::routes(spot, futures, local_client());

    let res = warp::test::request().path("/logo").reply(&routes).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body().as_ref(), b"Missing url param");

    let res = warp::test::request()
        .path("/logo?url=file%3A%2F%2F%2Fetc%2Fpasswd")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logo_proxies_image_bytes() {
    let upstream = warp::path("coin.png").map(|| vec![0x89u8, b'P', b'N', b'G']);
    let (addr, server) = warp::serve(upstream).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let (spot, futures) = markets_with_one_spot_event().await;
    let routes = api::routes(spot, futures, local_client());

    let res = warp::test::request()
        .path(&format!("/logo?url=http%3A%2F%2F{}%2Fcoin.png", addr))
        .reply(&routes)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(
        res.headers()["cache-control"],
        "public, max-age=2592000, immutable"
    );
    assert_eq!(res.body().as_ref(), &[0x89u8, b'P', b'N', b'G'][..]);
}

#[tokio::test]
async fn logo_upstream_failure_is_500() {
    let upstream = warp::path("missing.png")
        .map(|| warp::reply::with_status("gone", StatusCode::NOT_FOUND));
    let (addr, server) = warp::serve(upstream).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let (spot, futures) = markets_with_one_spot_event().await;
    let routes = api::routes(spot, futures, local_client());

    let res = warp::test::request()
        .path(&format!("/logo?url=http%3A%2F%2F{}%2Fmissing.png", addr))
        .reply(&routes)
        .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body().as_ref(), b"Error fetching image");
}
