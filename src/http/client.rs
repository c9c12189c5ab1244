//! Shared outbound HTTP client
//!
//! One pooled client per process, used by the proxy fallback and the Meetup
//! fetcher. Connections are returned to the pool after each response body is
//! consumed.

use crate::config::PerformanceConfig;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

pub type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Build the pooled client accepting both `http` and `https` upstreams
pub fn build_client(perf: &PerformanceConfig) -> HttpClient {
    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(perf.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(perf.pool_idle_timeout))
        .build(connector)
}
