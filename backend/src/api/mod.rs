//! Read API over the in-memory activity logs.
//!
//! Handlers only clone the published log snapshot, so a pending disk write
//! never delays a response. The activity endpoints always answer 200, even
//! for a market that has never synced.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::http::{HeaderMap, HeaderValue, StatusCode};
use warp::hyper::Body;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::market::manager::MarketManager;

const IMAGE_CACHE_CONTROL: &str = "public, max-age=2592000, immutable";

#[derive(Debug, Deserialize)]
pub struct LogoQuery {
    pub url: Option<String>,
}

/// All routes with permissive CORS headers attached.
pub fn routes(
    spot: Arc<MarketManager>,
    futures: Arc<MarketManager>,
    http: reqwest::Client,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let root = warp::path::end().and(read_method()).map(|| "ok");

    let spot = warp::path("spot")
        .and(warp::path::end())
        .and(read_method())
        .and(with_market(spot))
        .map(activity_reply);

    let futures = warp::path("futures")
        .and(warp::path::end())
        .and(read_method())
        .and(with_market(futures))
        .map(activity_reply);

    let logo = warp::path("logo")
        .and(warp::path::end())
        .and(read_method())
        .and(warp::query::<LogoQuery>())
        .and(warp::any().map(move || http.clone()))
        .and_then(logo_reply);

    // Preflight for any path; the CORS headers below are all it needs.
    let preflight = warp::options().map(warp::reply);

    root.or(spot)
        .or(futures)
        .or(logo)
        .or(preflight)
        .with(warp::reply::with::headers(cors_headers()))
}

fn read_method() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::get().or(warp::head()).unify()
}

fn with_market(
    mm: Arc<MarketManager>,
) -> impl Filter<Extract = (Arc<MarketManager>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&mm))
}

fn cors_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    h.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, HEAD, OPTIONS"),
    );
    h.insert("access-control-allow-headers", HeaderValue::from_static("*"));
    h
}

fn activity_reply(mm: Arc<MarketManager>) -> impl Reply {
    warp::reply::json(&*mm.snapshot())
}

async fn logo_reply(q: LogoQuery, http: reqwest::Client) -> Result<Response, Infallible> {
    let Some(url) = q.url.filter(|u| !u.is_empty()) else {
        return Ok(text(StatusCode::BAD_REQUEST, "Missing url param"));
    };

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Ok(text(StatusCode::BAD_REQUEST, "Unsupported url scheme"));
    }

    match fetch_image(&http, &url).await {
        Ok(bytes) => {
            let mut resp = Response::new(Body::from(bytes));
            let headers = resp.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL));
            Ok(resp)
        }
        Err(e) => {
            warn!(error = %e, url = %url, "logo fetch failed");
            Ok(text(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching image"))
        }
    }
}

async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let resp = http.get(url).send().await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

fn text(status: StatusCode, body: &'static str) -> Response {
    warp::reply::with_status(body, status).into_response()
}
