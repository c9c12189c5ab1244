//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Local routes are matched in
//! order (redirects, widget, reserved admin prefix); everything else goes to
//! the proxy fallback.

use crate::config::AppState;
use crate::error::Error;
use crate::handler::widget::{self, WidgetFormat};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::proxy;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{header, Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let mut entry = state
        .access_log_enabled()
        .then(|| access_entry(&req, remote_addr));

    let response = route_request(req, &state, entry.as_mut()).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn access_entry<B>(req: &Request<B>, remote_addr: Option<SocketAddr>) -> AccessLogEntry {
    let header_value = |name: header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header_value(header::REFERER);
    entry.user_agent = header_value(header::USER_AGENT);
    entry
}

/// Route request based on path and configuration
async fn route_request<B>(
    req: Request<B>,
    state: &Arc<AppState>,
    entry: Option<&mut AccessLogEntry>,
) -> Response<Full<Bytes>>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = req.uri().path();
    let is_head = req.method() == Method::HEAD;

    // 1. Fixed redirects
    if let Some(target) = state.config.routes.redirect_target(path) {
        if let Some(resp) = check_http_method(req.method()) {
            return resp;
        }
        return http::build_redirect_response(target);
    }

    // 2. Meetup widget
    if let Some(format) = WidgetFormat::from_path(path) {
        if let Some(resp) = check_http_method(req.method()) {
            return resp;
        }
        return widget::serve_widget(state, format, is_head).await;
    }

    // 3. Reserved admin prefix, never proxied
    if state.config.site.is_admin_path(path) {
        return http::build_404_response();
    }

    // 4. Everything else: static site
    proxy_request(req, state, entry).await
}

/// Only GET and HEAD are served by local routes
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get(header::CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

async fn proxy_request<B>(
    req: Request<B>,
    state: &Arc<AppState>,
    entry: Option<&mut AccessLogEntry>,
) -> Response<Full<Bytes>>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return resp;
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => return http::build_413_response(),
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return http::build_400_response();
        }
    };

    let base = &state.config.site.static_site;
    if let Some(entry) = entry {
        entry.upstream = proxy::upstream_uri(base, &parts.uri)
            .ok()
            .map(|u| u.to_string());
    }

    match proxy::forward(&state.client, base, &parts, body).await {
        Ok(resp) => resp,
        Err(e @ (Error::InvalidUri(_) | Error::Http(_))) => {
            logger::log_error(&format!("[Proxy] Cannot build upstream request: {e}"));
            http::build_500_response()
        }
        Err(e) => {
            logger::log_error(&format!("[Proxy] {} {} failed: {e}", parts.method, parts.uri));
            http::build_502_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Result;
    use crate::events::{parse_events, tests::API_RESPONSE, Event, EventSource};
    use crate::http::client::build_client;
    use async_trait::async_trait;
    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::StatusCode;
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;

    /// Event source returning a fixed outcome
    struct FakeEvents(Option<Vec<Event>>);

    #[async_trait]
    impl EventSource for FakeEvents {
        async fn upcoming_events(&self) -> Result<Vec<Event>> {
            self.0
                .clone()
                .ok_or(Error::UpstreamStatus(StatusCode::SERVICE_UNAVAILABLE))
        }
    }

    fn test_config(static_site: &str) -> Config {
        let mut config = Config::load_from("no-such-config-file").unwrap();
        config.site.static_site = static_site.to_string();
        config.logging.access_log = false;
        config
    }

    fn state_with(events: Option<Vec<Event>>, static_site: &str) -> Arc<AppState> {
        let config = test_config(static_site);
        let client = build_client(&config.performance);
        Arc::new(AppState::with_event_source(
            &config,
            client,
            Arc::new(FakeEvents(events)),
        ))
    }

    fn fixture_events() -> Option<Vec<Event>> {
        Some(parse_events(API_RESPONSE.as_bytes()).unwrap())
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> Response<Full<Bytes>> {
        let req = Request::builder()
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap();
        handle_request(req, Arc::clone(state), None).await.unwrap()
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Stand-in static site answering 203 with the method and URI it saw
    async fn spawn_upstream() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let svc = service_fn(|req: Request<Incoming>| async move {
                        let body = format!("{} {}", req.method(), req.uri());
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(StatusCode::NON_AUTHORITATIVE_INFORMATION)
                                .header("x-upstream", "static-site")
                                .body(Full::new(Bytes::from(body)))
                                .unwrap(),
                        )
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_home_redirect() {
        let state = state_with(Some(vec![]), "http://127.0.0.1:9/");
        let resp = get(&state, "/").await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "/index.html");
    }

    #[tokio::test]
    async fn test_coc_redirect() {
        let state = state_with(Some(vec![]), "http://127.0.0.1:9/");
        let resp = get(&state, "/coc").await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers()[header::LOCATION],
            "/pages/code-of-conduct.html"
        );
    }

    #[tokio::test]
    async fn test_redirect_rejects_post() {
        let state = state_with(Some(vec![]), "http://127.0.0.1:9/");
        let req = Request::builder()
            .method(Method::POST)
            .uri("/coc")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, state, None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_no_events() {
        let state = state_with(Some(vec![]), "http://127.0.0.1:9/");
        let resp = get(&state, "/meetup-widget.html").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("No upcoming events"));
    }

    #[tokio::test]
    async fn test_html_widget() {
        let state = state_with(fixture_events(), "http://127.0.0.1:9/");
        let resp = get(&state, "/meetup-widget.html").await;
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("text/html"));
        let body = body_string(resp).await;
        assert!(body.contains("UCSD Geisel Library"));
        assert!(body.contains("Qualcomm Building Q"));
    }

    #[tokio::test]
    async fn test_json_widget() {
        let state = state_with(fixture_events(), "http://127.0.0.1:9/");
        let resp = get(&state, "/meetup-widget.json").await;
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        let venues: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["venue"].as_str().unwrap())
            .collect();
        assert_eq!(
            venues,
            vec!["UCSD Geisel Library", "UCSD Geisel Library", "Qualcomm Building Q"]
        );
        assert_eq!(json[0]["datetime"], "2019-10-12T12:00:00-07:00");
    }

    #[tokio::test]
    async fn test_cors() {
        for events in [fixture_events(), None] {
            let state = state_with(events, "http://127.0.0.1:9/");
            for path in ["/meetup-widget.html", "/meetup-widget.json"] {
                let resp = get(&state, path).await;
                assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            }
        }
    }

    #[tokio::test]
    async fn test_api_failure() {
        let state = state_with(None, "http://127.0.0.1:9/");
        let resp = get(&state, "/meetup-widget.json").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "[]");

        let resp = get(&state, "/meetup-widget.html").await;
        assert!(body_string(resp).await.contains("No upcoming events"));
    }

    #[tokio::test]
    async fn test_unreachable_meetup_api() {
        let mut config = test_config("http://127.0.0.1:9/");
        // Nothing listens on the discard port
        config.meetup.api_url = "http://127.0.0.1:9/pythonsd/events".to_string();
        let state = Arc::new(AppState::new(&config));

        let resp = get(&state, "/meetup-widget.json").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body_string(resp).await, "[]");
    }

    #[tokio::test]
    async fn test_unserved_path_is_proxied() {
        let upstream = spawn_upstream().await;
        let state = state_with(Some(vec![]), &format!("http://{upstream}/pythonsd.org/"));

        let resp = get(&state, "/mock-path?page=2").await;
        assert_eq!(resp.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
        assert_eq!(resp.headers()["x-upstream"], "static-site");
        assert_eq!(body_string(resp).await, "GET /pythonsd.org/mock-path?page=2");
    }

    #[tokio::test]
    async fn test_proxy_keeps_method() {
        let upstream = spawn_upstream().await;
        let state = state_with(Some(vec![]), &format!("http://{upstream}/"));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/contact")
            .body(Full::new(Bytes::from("name=guido")))
            .unwrap();
        let resp = handle_request(req, state, None).await.unwrap();
        assert_eq!(body_string(resp).await, "POST /contact");
    }

    #[tokio::test]
    async fn test_proxy_transport_failure() {
        // Reserve a port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = state_with(Some(vec![]), &format!("http://{addr}/"));
        let resp = get(&state, "/index.html").await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_admin_path_not_proxied() {
        let state = state_with(Some(vec![]), "http://127.0.0.1:9/");
        let resp = get(&state, "/admin/login/").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let upstream = spawn_upstream().await;
        let mut config = test_config(&format!("http://{upstream}/"));
        config.http.max_body_size = 4;
        let client = build_client(&config.performance);
        let state = Arc::new(AppState::with_event_source(
            &config,
            client,
            Arc::new(FakeEvents(Some(vec![]))),
        ));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .body(Full::new(Bytes::from("too many bytes")))
            .unwrap();
        let resp = handle_request(req, state, None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
