//! Upcoming events
//!
//! Normalizes the Meetup API payload into fixed [`Event`] records. Fetching
//! sits behind [`EventSource`] so handlers never depend on the network
//! directly.

mod meetup;

pub use meetup::MeetupClient;

use crate::error::{Error, Result};
use crate::logger;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize, Serializer};

/// One upcoming event, shape independent of the upstream schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub link: String,
    pub name: String,
    #[serde(serialize_with = "serialize_iso8601")]
    pub datetime: DateTime<FixedOffset>,
    pub venue: String,
}

fn serialize_iso8601<S: Serializer>(
    dt: &DateTime<FixedOffset>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, false))
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch upcoming events in upstream order
    async fn upcoming_events(&self) -> Result<Vec<Event>>;
}

/// Fields read from a single Meetup event entry
#[derive(Debug, Deserialize)]
struct RawEvent {
    link: String,
    name: String,
    /// Start time, epoch milliseconds
    time: i64,
    /// Offset from UTC in milliseconds
    #[serde(default)]
    utc_offset: i64,
    venue: RawVenue,
}

#[derive(Debug, Deserialize)]
struct RawVenue {
    name: String,
}

impl RawEvent {
    fn into_event(self) -> Option<Event> {
        let offset = FixedOffset::east_opt(i32::try_from(self.utc_offset / 1000).ok()?)?;
        let datetime = DateTime::from_timestamp_millis(self.time)?.with_timezone(&offset);
        Some(Event {
            link: self.link,
            name: self.name,
            datetime,
            venue: self.venue.name,
        })
    }
}

/// Parse a Meetup events payload
///
/// The payload must be a JSON array. Entries that lack a required field, or
/// carry one of the wrong type, are skipped.
pub fn parse_events(body: &[u8]) -> Result<Vec<Event>> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(Error::Payload("expected a JSON array of events".to_string()));
    };

    let events = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let event = serde_json::from_value::<RawEvent>(entry)
                .ok()
                .and_then(RawEvent::into_event);
            if event.is_none() {
                logger::log_debug(&format!("[Meetup] Skipping incomplete event #{index}"));
            }
            event
        })
        .collect();

    Ok(events)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const API_RESPONSE: &str = include_str!("testdata/meetup-events-api.json");

    #[test]
    fn test_parse_fixture() {
        let events = parse_events(API_RESPONSE.as_bytes()).unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(
            events[0].link,
            "https://www.meetup.com/pythonsd/events/fdzbnqyznbqb/"
        );
        assert_eq!(events[0].name, "Saturday Study Group");
        assert_eq!(events[0].venue, "UCSD Geisel Library");
        assert_eq!(events[1].venue, "UCSD Geisel Library");
        assert_eq!(events[2].name, "Monthly Meetup");
        assert_eq!(events[2].venue, "Qualcomm Building Q");
    }

    #[test]
    fn test_json_shape() {
        let events = parse_events(API_RESPONSE.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&events).unwrap();
        let expected = serde_json::json!([
            {
                "link": "https://www.meetup.com/pythonsd/events/fdzbnqyznbqb/",
                "name": "Saturday Study Group",
                "datetime": "2019-10-12T12:00:00-07:00",
                "venue": "UCSD Geisel Library",
            },
            {
                "link": "https://www.meetup.com/pythonsd/events/fdzbnqyznbzb/",
                "name": "Saturday Study Group",
                "datetime": "2019-10-19T12:00:00-07:00",
                "venue": "UCSD Geisel Library",
            },
            {
                "link": "https://www.meetup.com/pythonsd/events/zgtnxqyznbgc/",
                "name": "Monthly Meetup",
                "datetime": "2019-10-24T19:00:00-07:00",
                "venue": "Qualcomm Building Q",
            },
        ]);
        assert_eq!(json, expected);
    }

    #[test]
    fn test_incomplete_entries_skipped() {
        let body = br#"[
            {"link": "https://a", "name": "No venue", "time": 1570906800000},
            {"link": "https://b", "name": "Kept", "time": 1570906800000, "venue": {"name": "Library"}},
            {"name": "No link", "time": 1570906800000, "venue": {"name": "Library"}},
            {"link": "https://c", "name": "Bad time", "time": "soon", "venue": {"name": "Library"}},
            {"link": "https://d", "name": "Also kept", "time": 1571511600000, "utc_offset": 3600000, "venue": {"name": "Hall"}}
        ]"#;
        let events = parse_events(body).unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Kept", "Also kept"]);
        // missing utc_offset means UTC
        assert_eq!(events[0].datetime.offset().local_minus_utc(), 0);
        assert_eq!(events[1].datetime.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(parse_events(b"not json").is_err());
        assert!(matches!(
            parse_events(br#"{"errors": [{"code": "throttled"}]}"#),
            Err(Error::Payload(_))
        ));
        assert!(parse_events(b"[]").unwrap().is_empty());
    }
}
