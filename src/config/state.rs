// Application state module
// Shared by every connection: configuration, pooled client, event source

use std::sync::Arc;

use super::types::Config;
use crate::events::{EventSource, MeetupClient};
use crate::http::client::{build_client, HttpClient};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Pooled upstream client shared by the proxy and the Meetup fetcher
    pub client: HttpClient,
    pub events: Arc<dyn EventSource>,
}

impl AppState {
    /// Production state: events come from the Meetup API
    pub fn new(config: &Config) -> Self {
        let client = build_client(&config.performance);
        let events = Arc::new(MeetupClient::new(
            client.clone(),
            config.meetup.api_url.clone(),
        ));
        Self::with_event_source(config, client, events)
    }

    /// State with an explicit event source
    pub fn with_event_source(
        config: &Config,
        client: HttpClient,
        events: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            config: config.clone(),
            client,
            events,
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_access_log_follows_config() {
        let mut config = Config::load_from("no-such-config-file").unwrap();
        assert!(AppState::new(&config).access_log_enabled());

        config.logging.access_log = false;
        assert!(!AppState::new(&config).access_log_enabled());
    }
}
