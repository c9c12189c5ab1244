//! Proxy fallback
//!
//! Forwards unmatched requests to the statically hosted site and relays the
//! upstream status, headers and body.

use crate::error::{Error, Result};
use crate::http::client::HttpClient;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName};
use hyper::http::request::Parts;
use hyper::{Request, Response, Uri, Version};

/// Headers scoped to a single connection, never forwarded
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Copy end-to-end headers, dropping hop-by-hop ones and `Host`
fn forwardable_headers(src: &HeaderMap, keep_host: bool) -> HeaderMap {
    let mut dst = HeaderMap::with_capacity(src.len());
    for (name, value) in src {
        if is_hop_by_hop(name) || (!keep_host && name == header::HOST) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
    dst
}

/// Upstream URI: base URL without its trailing `/`, then the request path and query
pub fn upstream_uri(base: &str, uri: &Uri) -> Result<Uri> {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let target = format!("{}{}", base.trim_end_matches('/'), path_and_query);
    Ok(target.parse()?)
}

/// Forward a request whose body has already been read
pub async fn forward(
    client: &HttpClient,
    base: &str,
    parts: &Parts,
    body: Bytes,
) -> Result<Response<Full<Bytes>>> {
    let target = upstream_uri(base, &parts.uri)?;

    let mut req = Request::builder()
        .method(parts.method.clone())
        .uri(target)
        .version(Version::HTTP_11)
        .body(Full::new(body))?;
    *req.headers_mut() = forwardable_headers(&parts.headers, false);

    let upstream = client.request(req).await?;
    let (resp_parts, resp_body) = upstream.into_parts();
    let bytes = resp_body
        .collect()
        .await
        .map_err(|e| Error::Body(e.to_string()))?
        .to_bytes();

    let mut resp = Response::builder()
        .status(resp_parts.status)
        .body(Full::new(bytes))?;
    *resp.headers_mut() = forwardable_headers(&resp_parts.headers, true);
    Ok(resp)
}
