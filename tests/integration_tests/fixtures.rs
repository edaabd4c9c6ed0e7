//! Test fixtures for integration tests
//!
//! Provides sample listing pages, a country feed, a recording channel and a
//! helper that wires a monitor against a mock server.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cubewatch::config::Config;
use cubewatch::crawler::Crawler;
use cubewatch::i18n::Translations;
use cubewatch::notifications::{
    Channel, ChannelResult, DeliveryStatus, NotificationFormatter, Outbound,
};
use cubewatch::pipeline::{Monitor, MonitorOptions};
use cubewatch::storage::{create_sqlite_repository, SharedCompetitionRepository};

/// Country reference feed
pub const COUNTRIES_JSON: &str = r#"{"items":[
    {"name":"Chile","iso2Code":"CL"},
    {"name":"Argentina","iso2Code":"AR"},
    {"name":"New Zealand","iso2Code":"NZ"},
    {"name":"United States","iso2Code":"US"}
]}"#;

/// One listing row: slug, date text, location text
pub type Row<'a> = (&'a str, &'a str, &'a str);

/// Listing page in `display=list` layout
pub fn listing_html(rows: &[Row<'_>]) -> String {
    let items: String = rows
        .iter()
        .map(|(slug, date, location)| {
            format!(
                r#"
  <li class="list-group-item not-past">
    <span class="icon"><i class="flag"></i></span>
    <span class="competition-info">
      <a href="/competitions/{slug}">{slug}</a>
    </span>
    <span class="date">{date}</span>
    <div class="location"><strong>{location}</strong></div>
  </li>"#
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Competitions</title></head>
<body>
<div id="competitions-list">
<ul class="list-group">{items}
</ul>
</div>
</body>
</html>"#
    )
}

/// Listing page without any competition
pub const EMPTY_LISTING_HTML: &str = r#"
<!DOCTYPE html>
<html><body><div id="competitions-list"><p>No competitions</p></div></body></html>
"#;

/// Channel that keeps every delivery in memory
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<Outbound>>,
    pub reject: bool,
}

impl RecordingChannel {
    pub fn rejecting() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn deliveries(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, outbound: &Outbound) -> ChannelResult<DeliveryStatus> {
        self.sent.lock().unwrap().push(outbound.clone());
        if self.reject {
            Ok(DeliveryStatus::failure("recording", "rejected"))
        } else {
            Ok(DeliveryStatus::success("recording"))
        }
    }
}

/// Monitor wired to a mock server and a temporary SQLite store
pub struct TestEnv {
    pub server: MockServer,
    pub monitor: Monitor,
    pub store: SharedCompetitionRepository,
    pub channel: Arc<RecordingChannel>,
    _dir: TempDir,
}

impl TestEnv {
    /// Mock server serving the country feed; listings are mounted per test
    pub async fn start() -> Self {
        Self::with_channel(RecordingChannel::default(), MonitorOptions::default()).await
    }

    pub async fn with_channel(channel: RecordingChannel, options: MonitorOptions) -> Self {
        let server = MockServer::start().await;
        mount_countries(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let store = create_sqlite_repository(dir.path().join("competitions.db")).unwrap();
        let channel = Arc::new(channel);

        let config = test_config(&server);
        let monitor = Monitor::new(
            Arc::new(Crawler::new(&config).unwrap()),
            Arc::clone(&store),
            NotificationFormatter::new(Arc::new(Translations::embedded().unwrap())),
            channel.clone(),
            options,
        );

        Self {
            server,
            monitor,
            store,
            channel,
            _dir: dir,
        }
    }

    /// Serve `html` as the listing for `region` (display form)
    pub async fn mount_listing(&self, region: &str, html: String) {
        Mock::given(method("GET"))
            .and(path("/competitions"))
            .and(query_param("region", region))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&self.server)
            .await;
    }

    /// Absolute url of a competition slug on the mock host
    pub fn url(&self, slug: &str) -> String {
        format!("{}/competitions/{slug}", self.server.uri())
    }
}

/// Serve the country reference feed
pub async fn mount_countries(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/countries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COUNTRIES_JSON))
        .mount(server)
        .await;
}

/// Configuration pointing every endpoint at `server`
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.listing.base_url = server.uri();
    config.listing.rate_limit = 50;
    config.listing.max_retries = 1;
    config.listing.retry_base_delay_ms = 5;
    config.countries.feed_url = format!("{}/countries.json", server.uri());
    config
}
