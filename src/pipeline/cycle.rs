//! Fetch → diff → persist → notify cycle
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │  purge    │──▶│  Crawler  │──▶│   diff   │──▶│  insert   │──▶│  Channel │
//! │ (expired) │   │ (resolve, │   │ (url set)│   │ (per row) │   │ (notify) │
//! └───────────┘   │  listing) │   └──────────┘   └───────────┘   └──────────┘
//!                 └───────────┘
//! ```
//!
//! Store writes of one cycle run under a single async mutex. On-demand
//! queries never touch the store and therefore never wait on it.

use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::NotificationsConfig;
use crate::crawler::{Crawler, Resolution};
use crate::error::Result;
use crate::models::{Competition, Session};
use crate::notifications::{
    DeliveryStatus, NotificationFormatter, Outbound, Paginator, SharedChannel,
};
use crate::pipeline::diff::diff;
use crate::storage::SharedCompetitionRepository;

/// Delivery options for new-competition notifications
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Prefix for the announcement text (role or user mention)
    pub mention: Option<String>,
    /// One numbered text message instead of one block per competition
    pub combined: bool,
    /// Competitions per page in the current-competitions view
    pub page_size: usize,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            mention: None,
            combined: false,
            page_size: crate::notifications::pagination::DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&NotificationsConfig> for MonitorOptions {
    fn from(config: &NotificationsConfig) -> Self {
        Self {
            mention: config.mention.clone(),
            combined: config.combined,
            page_size: config.page_size,
        }
    }
}

/// Summary of one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Canonical country the cycle ran for
    pub country: String,
    /// Expired rows removed before the diff
    pub purged: usize,
    /// Competitions parsed from the listing
    pub fetched: usize,
    /// Competitions not present in the known set
    pub new: usize,
    /// New competitions written to the store
    pub stored: usize,
    /// Urls whose insert failed
    pub failed: Vec<String>,
    /// Outcome of the notification, `None` when nothing was new
    pub delivery: Option<DeliveryStatus>,
}

impl CycleReport {
    pub fn delivered(&self) -> bool {
        self.delivery.as_ref().is_some_and(|d| d.success)
    }
}

/// Result of an on-demand query
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// Listing returned at least one competition
    Found {
        resolution: Resolution,
        competitions: Vec<Competition>,
    },
    /// Listing fetched but empty
    Empty { resolution: Resolution },
    /// Network or upstream failure; detail is only logged
    Failed,
}

impl QueryOutcome {
    pub fn competitions(&self) -> &[Competition] {
        match self {
            Self::Found { competitions, .. } => competitions,
            Self::Empty { .. } | Self::Failed => &[],
        }
    }
}

/// Runs monitoring cycles and on-demand queries
pub struct Monitor {
    crawler: Arc<Crawler>,
    store: SharedCompetitionRepository,
    formatter: NotificationFormatter,
    channel: SharedChannel,
    options: MonitorOptions,
    write_lock: Mutex<()>,
}

impl Monitor {
    pub fn new(
        crawler: Arc<Crawler>,
        store: SharedCompetitionRepository,
        formatter: NotificationFormatter,
        channel: SharedChannel,
        options: MonitorOptions,
    ) -> Self {
        Self {
            crawler,
            store,
            formatter,
            channel,
            options,
            write_lock: Mutex::new(()),
        }
    }

    pub fn crawler(&self) -> &Crawler {
        &self.crawler
    }

    pub fn store(&self) -> &SharedCompetitionRepository {
        &self.store
    }

    pub fn formatter(&self) -> &NotificationFormatter {
        &self.formatter
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Run one cycle for today's local date
    pub async fn run_cycle_now(&self, session: &Session) -> Result<CycleReport> {
        self.run_cycle(session, chrono::Local::now().date_naive()).await
    }

    /// Purge expired rows, fetch, diff, persist new rows and announce them
    ///
    /// Only competitions that were actually stored are announced; a failed
    /// insert is picked up again as new at the next cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the purge, the fetch or the known-set load fails.
    /// Per-row insert failures and delivery failures are reported, not raised.
    pub async fn run_cycle(&self, session: &Session, today: NaiveDate) -> Result<CycleReport> {
        let _guard = self.write_lock.lock().await;

        let purged = self.store.purge_expired(today)?;
        if purged > 0 {
            tracing::info!(purged, as_of = %today, "Expired competitions purged");
        }

        let (resolution, current) = self.crawler.fetch_current(&session.country).await?;
        let known = self.store.load_known(today)?;
        let new = diff(&current, &known);

        let mut report = CycleReport {
            country: resolution.display_name(),
            purged,
            fetched: current.len(),
            new: new.len(),
            ..Default::default()
        };

        if new.is_empty() {
            tracing::info!(
                country = %report.country,
                fetched = report.fetched,
                known = known.len(),
                "No new competitions"
            );
            return Ok(report);
        }

        let batch = self.store.insert_all(&new);
        report.stored = batch.inserted;
        report.failed = batch.failed;

        let announce: Vec<Competition> = new
            .into_iter()
            .filter(|c| !report.failed.contains(&c.url))
            .collect();

        if !announce.is_empty() {
            let outbound = self.build_delivery(&announce, &session.locale);
            report.delivery = Some(self.deliver(&outbound).await);
        }

        tracing::info!(
            country = %report.country,
            fetched = report.fetched,
            new = report.new,
            stored = report.stored,
            failed = report.failed.len(),
            delivered = report.delivered(),
            "Cycle complete"
        );

        Ok(report)
    }

    /// Fetch current competitions without touching the store
    pub async fn query(&self, session: &Session) -> QueryOutcome {
        match self.crawler.fetch_current(&session.country).await {
            Ok((resolution, competitions)) if competitions.is_empty() => {
                QueryOutcome::Empty { resolution }
            }
            Ok((resolution, competitions)) => QueryOutcome::Found {
                resolution,
                competitions,
            },
            Err(e) => {
                tracing::error!(country = %session.country, error = %e, "On-demand query failed");
                QueryOutcome::Failed
            }
        }
    }

    /// Current-competitions view for a zero-based page
    ///
    /// Failures render as the generic fetch-failed text.
    pub async fn page(&self, session: &Session, page_index: usize) -> Outbound {
        let outcome = self.query(session).await;
        self.render_page(&outcome, page_index, &session.locale)
    }

    /// Render one page of a query outcome
    pub fn render_page(&self, outcome: &QueryOutcome, page_index: usize, locale: &str) -> Outbound {
        let resolution = match outcome {
            QueryOutcome::Found { resolution, .. } | QueryOutcome::Empty { resolution } => resolution,
            QueryOutcome::Failed => return Outbound::text(self.formatter.fetch_failed(locale)),
        };

        let competitions = outcome.competitions();
        let paginator = Paginator::new(competitions.len(), self.options.page_size).at(page_index);
        let message = self.formatter.format_page(
            competitions,
            &paginator,
            &resolution.display_name(),
            locale,
        );
        Outbound::with_blocks(self.formatter.format_controls(&paginator, locale), vec![message])
    }

    /// Remove one stored competition by url
    pub async fn delete(&self, url: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let removed = self.store.delete(url)?;
        tracing::info!(url = %url, removed, "Delete requested");
        Ok(removed)
    }

    /// Remove every stored competition that ended before `today`
    pub async fn purge(&self, today: NaiveDate) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        Ok(self.store.purge_expired(today)?)
    }

    fn build_delivery(&self, competitions: &[Competition], locale: &str) -> Outbound {
        let header = self.formatter.format_announcement(
            competitions.len(),
            locale,
            self.options.mention.as_deref(),
        );

        if self.options.combined {
            let body = self.formatter.format_combined(competitions, locale);
            Outbound::text(format!("{header}\n\n{body}"))
        } else {
            Outbound::with_blocks(Some(header), self.formatter.format(competitions, locale))
        }
    }

    async fn deliver(&self, outbound: &Outbound) -> DeliveryStatus {
        match self.channel.send(outbound).await {
            Ok(status) => {
                if !status.success {
                    tracing::warn!(status = %status, "Notification not accepted");
                }
                status
            }
            Err(e) => {
                tracing::error!(channel = self.channel.name(), error = %e, "Notification failed");
                DeliveryStatus::failure(self.channel.name(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::i18n::Translations;
    use crate::notifications::{Channel, ChannelResult};
    use crate::storage::{create_mock_repository, CompetitionRepository, MockCompetitionRepository};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingChannel {
        sent: StdMutex<Vec<Outbound>>,
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, outbound: &Outbound) -> ChannelResult<DeliveryStatus> {
            self.sent.lock().unwrap().push(outbound.clone());
            Ok(DeliveryStatus::success("recording"))
        }
    }

    const COUNTRIES: &str = r#"{"items":[{"name":"Chile","iso2Code":"CL"},{"name":"Argentina","iso2Code":"AR"}]}"#;

    fn listing_html(rows: &[(&str, &str, &str)]) -> String {
        let items: String = rows
            .iter()
            .map(|(slug, date, city)| {
                format!(
                    r#"<li><span class="competition-info"><a href="/competitions/{slug}">{slug}</a></span>
                       <span class="date">{date}</span>
                       <div class="location">Chile, {city}</div></li>"#
                )
            })
            .collect();
        format!("<html><body><ul>{items}</ul></body></html>")
    }

    async fn server_with(rows: &[(&str, &str, &str)]) -> MockServer {
        slow_server_with(rows, Duration::ZERO).await
    }

    async fn slow_server_with(rows: &[(&str, &str, &str)], delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countries.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COUNTRIES))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/competitions"))
            .and(query_param("region", "Chile"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing_html(rows))
                    .set_delay(delay),
            )
            .mount(&server)
            .await;
        server
    }

    fn monitor(
        server: &MockServer,
        store: SharedCompetitionRepository,
        channel: Arc<RecordingChannel>,
        options: MonitorOptions,
    ) -> Monitor {
        let mut config = Config::default();
        config.listing.base_url = server.uri();
        config.listing.max_retries = 0;
        config.countries.feed_url = format!("{}/countries.json", server.uri());

        let crawler = Arc::new(Crawler::new(&config).unwrap());
        let formatter = NotificationFormatter::new(Arc::new(Translations::embedded().unwrap()));
        Monitor::new(crawler, store, formatter, channel, options)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_cycle_announces_only_new() {
        let server = server_with(&[
            ("SantiagoOpen2024", "Jun 10 - 12, 2024", "Santiago"),
            ("ValpoCubing2024", "Jul 6, 2024", "Valparaíso"),
        ])
        .await;
        let store = create_mock_repository();
        let channel = Arc::new(RecordingChannel::default());
        let monitor = monitor(&server, store.clone(), channel.clone(), MonitorOptions::default());
        let session = Session::new("CL", "en");

        let first = monitor.run_cycle(&session, date(2024, 6, 1)).await.unwrap();
        assert_eq!(first.country, "Chile");
        assert_eq!(first.fetched, 2);
        assert_eq!(first.new, 2);
        assert_eq!(first.stored, 2);
        assert!(first.delivered());

        let second = monitor.run_cycle(&session, date(2024, 6, 2)).await.unwrap();
        assert_eq!(second.new, 0);
        assert!(second.delivery.is_none());

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].content.as_deref(),
            Some("New competitions are available! (2)")
        );
        assert_eq!(sent[0].blocks.len(), 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cycle_purges_before_diff() {
        let server = server_with(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Santiago")]).await;
        let store = create_mock_repository();
        let channel = Arc::new(RecordingChannel::default());
        let monitor = monitor(&server, store.clone(), channel, MonitorOptions::default());
        let session = Session::new("Chile", "es");

        monitor.run_cycle(&session, date(2024, 6, 1)).await.unwrap();
        let report = monitor.run_cycle(&session, date(2024, 7, 1)).await.unwrap();

        assert_eq!(report.purged, 1);
        assert_eq!(report.new, 1);
    }

    #[tokio::test]
    async fn test_failed_insert_not_announced() {
        let server = server_with(&[
            ("SantiagoOpen2024", "Jun 10 - 12, 2024", "Santiago"),
            ("ValpoCubing2024", "Jul 6, 2024", "Valparaíso"),
        ])
        .await;
        let mock = Arc::new(MockCompetitionRepository::new());
        mock.fail_on(format!("{}/competitions/ValpoCubing2024", server.uri()));
        let channel = Arc::new(RecordingChannel::default());
        let monitor = monitor(&server, mock.clone(), channel.clone(), MonitorOptions::default());

        let report = monitor
            .run_cycle(&Session::new("Chile", "en"), date(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(channel.sent.lock().unwrap()[0].blocks.len(), 1);
    }

    #[tokio::test]
    async fn test_combined_delivery_with_mention() {
        let server = server_with(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Santiago")]).await;
        let channel = Arc::new(RecordingChannel::default());
        let options = MonitorOptions {
            mention: Some("@cubers".to_string()),
            combined: true,
            ..Default::default()
        };
        let monitor = monitor(&server, create_mock_repository(), channel.clone(), options);

        monitor
            .run_cycle(&Session::new("Chile", "en"), date(2024, 6, 1))
            .await
            .unwrap();

        let sent = channel.sent.lock().unwrap();
        let text = sent[0].content.as_deref().unwrap();
        assert!(text.starts_with("@cubers New competitions are available! (1)\n\n1. Name: SantiagoOpen2024"));
        assert!(sent[0].blocks.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_cycle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let store = create_mock_repository();
        let monitor = monitor(
            &server,
            store.clone(),
            Arc::new(RecordingChannel::default()),
            MonitorOptions::default(),
        );

        let result = monitor
            .run_cycle(&Session::new("Chile", "en"), date(2024, 6, 1))
            .await;
        assert!(result.is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_cycles_announce_once() {
        let server = slow_server_with(
            &[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Santiago")],
            Duration::from_millis(200),
        )
        .await;
        let store = create_mock_repository();
        let channel = Arc::new(RecordingChannel::default());
        let monitor = monitor(&server, store.clone(), channel.clone(), MonitorOptions::default());
        let session = Session::new("Chile", "en");

        let (a, b) = tokio::join!(
            monitor.run_cycle(&session, date(2024, 6, 1)),
            monitor.run_cycle(&session, date(2024, 6, 1)),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.new + b.new, 1);
        assert_eq!(a.stored + b.stored, 1);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_waits_for_running_cycle() {
        let server = slow_server_with(
            &[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Santiago")],
            Duration::from_millis(200),
        )
        .await;
        let store = create_mock_repository();
        let monitor = monitor(
            &server,
            store.clone(),
            Arc::new(RecordingChannel::default()),
            MonitorOptions::default(),
        );
        let url = format!("{}/competitions/SantiagoOpen2024", server.uri());

        let session = Session::new("Chile", "en");
        let (report, removed) = tokio::join!(
            monitor.run_cycle(&session, date(2024, 6, 1)),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                monitor.delete(&url).await
            },
        );

        assert_eq!(report.unwrap().stored, 1);
        assert!(removed.unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_does_not_touch_store() {
        let server = server_with(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Santiago")]).await;
        let store = create_mock_repository();
        let monitor = monitor(
            &server,
            store.clone(),
            Arc::new(RecordingChannel::default()),
            MonitorOptions::default(),
        );

        let outcome = monitor.query(&Session::new("cl", "es")).await;
        assert_eq!(outcome.competitions().len(), 1);
        assert_eq!(store.count().unwrap(), 0);

        let page = monitor.render_page(&outcome, 0, "es");
        assert_eq!(page.blocks[0].title.as_deref(), Some("Torneos actuales en Chile"));
    }

    #[tokio::test]
    async fn test_query_empty_and_failed() {
        let server = server_with(&[]).await;
        let monitor = monitor(
            &server,
            create_mock_repository(),
            Arc::new(RecordingChannel::default()),
            MonitorOptions::default(),
        );

        let outcome = monitor.query(&Session::new("Chile", "en")).await;
        assert!(matches!(outcome, QueryOutcome::Empty { .. }));
        let page = monitor.render_page(&outcome, 0, "en");
        assert_eq!(page.blocks[0].description.as_deref(), Some("No competitions found."));
        assert_eq!(page.content, None);

        let failed = monitor.render_page(&QueryOutcome::Failed, 0, "en");
        assert!(failed.blocks.is_empty());
        assert_eq!(failed.content, Some(monitor.formatter().fetch_failed("en")));
    }

    #[tokio::test]
    async fn test_delete_and_purge() {
        let server = MockServer::start().await;
        let store = create_mock_repository();
        let url = "https://www.worldcubeassociation.org/competitions/A";
        store
            .insert(&Competition {
                name: "A".to_string(),
                url: url.to_string(),
                start_date: date(2024, 6, 1),
                end_date: date(2024, 6, 1),
                country: "Chile".to_string(),
                location: "Santiago".to_string(),
            })
            .unwrap();
        let monitor = monitor(
            &server,
            store.clone(),
            Arc::new(RecordingChannel::default()),
            MonitorOptions::default(),
        );

        assert_eq!(monitor.purge(date(2024, 6, 1)).await.unwrap(), 0);
        assert!(monitor.delete(url).await.unwrap());
        assert!(!monitor.delete(url).await.unwrap());
    }
}
