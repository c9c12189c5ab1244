//! Meetup widget
//!
//! Renders upcoming events as an embeddable HTML fragment or a JSON array.
//! Upstream failures render as an empty event list.

use crate::config::AppState;
use crate::events::Event;
use crate::http;
use crate::logger;
use chrono::SecondsFormat;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fmt::Write;

pub const HTML_PATH: &str = "/meetup-widget.html";
pub const JSON_PATH: &str = "/meetup-widget.json";

const EMPTY_MESSAGE: &str = "No upcoming events";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetFormat {
    Html,
    Json,
}

impl WidgetFormat {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            HTML_PATH => Some(Self::Html),
            JSON_PATH => Some(Self::Json),
            _ => None,
        }
    }
}

/// Serve the widget, always with `Access-Control-Allow-Origin: *`
pub async fn serve_widget(
    state: &AppState,
    format: WidgetFormat,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let events = match state.events.upcoming_events().await {
        Ok(events) => events,
        Err(e) => {
            logger::log_warning(&format!("[Meetup] Falling back to no events: {e}"));
            Vec::new()
        }
    };

    match format {
        WidgetFormat::Html => http::build_cors_response(
            Bytes::from(render_html(&events)),
            "text/html; charset=utf-8",
            is_head,
        ),
        WidgetFormat::Json => {
            http::build_cors_response(render_json(&events), "application/json", is_head)
        }
    }
}

pub fn render_json(events: &[Event]) -> Bytes {
    serde_json::to_vec(events).map_or_else(
        |e| {
            logger::log_error(&format!("[Meetup] Failed to encode events: {e}"));
            Bytes::from_static(b"[]")
        },
        Bytes::from,
    )
}

pub fn render_html(events: &[Event]) -> String {
    if events.is_empty() {
        return format!("<p class=\"meetup-events-empty\">{EMPTY_MESSAGE}</p>\n");
    }

    let mut html = String::from("<ul class=\"meetup-events\">\n");
    for event in events {
        // Writing into a String cannot fail
        let _ = write!(
            html,
            concat!(
                "  <li class=\"meetup-event\">\n",
                "    <a class=\"meetup-event-name\" href=\"{link}\">{name}</a>\n",
                "    <span class=\"meetup-event-venue\">{venue}</span>\n",
                "    <time datetime=\"{iso}\">{when}</time>\n",
                "  </li>\n",
            ),
            link = escape_html(&event.link),
            name = escape_html(&event.name),
            venue = escape_html(&event.venue),
            iso = event.datetime.to_rfc3339_opts(SecondsFormat::Secs, false),
            when = event.datetime.format("%a, %b %-d, %Y %-I:%M %p"),
        );
    }
    html.push_str("</ul>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
