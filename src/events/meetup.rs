// Meetup.com event source

use super::{parse_events, Event, EventSource};
use crate::error::{Error, Result};
use crate::http::client::HttpClient;
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{header, Method, Request, Uri};

/// Fetches the group's upcoming events through the shared client
pub struct MeetupClient {
    client: HttpClient,
    api_url: String,
}

impl MeetupClient {
    pub const fn new(client: HttpClient, api_url: String) -> Self {
        Self { client, api_url }
    }
}

#[async_trait]
impl EventSource for MeetupClient {
    async fn upcoming_events(&self) -> Result<Vec<Event>> {
        let uri: Uri = self.api_url.parse()?;
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::ACCEPT, "application/json")
            .body(Full::new(Bytes::new()))?;

        let resp = self.client.request(req).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus(status));
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::Body(e.to_string()))?
            .to_bytes();

        parse_events(&body)
    }
}
