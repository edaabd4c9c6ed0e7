//! Error handling and recovery scenarios
//!
//! Network failures abort only the current cycle, malformed rows are skipped,
//! and store state survives every failure mode.

use chrono::NaiveDate;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cubewatch::error::{CubewatchErrorTrait, Error, ErrorCategory};
use cubewatch::models::{Competition, Session};
use cubewatch::pipeline::QueryOutcome;
use cubewatch::storage::{CompetitionRepository, SqliteCompetitionRepository};
use cubewatch::utils::error::{FetchError, StoreError};

use super::fixtures::{listing_html, test_config, TestEnv};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_listing_server_error_aborts_cycle() {
    let env = TestEnv::start().await;
    Mock::given(method("GET"))
        .and(path("/competitions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2) // first attempt + 1 retry
        .mount(&env.server)
        .await;

    let result = env
        .monitor
        .run_cycle(&Session::new("Chile", "en"), date(2024, 6, 1))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::MaxRetriesExceeded)));
    assert!(err.is_recoverable());
    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(env.channel.deliveries().is_empty());
}

#[tokio::test]
async fn test_listing_not_found_not_retried() {
    let env = TestEnv::start().await;
    Mock::given(method("GET"))
        .and(path("/competitions"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&env.server)
        .await;

    let err = env
        .monitor
        .run_cycle(&Session::new("Chile", "en"), date(2024, 6, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::ServerError(404))));
}

#[tokio::test]
async fn test_cycle_recovers_after_failure() {
    let env = TestEnv::start().await;
    Mock::given(method("GET"))
        .and(path("/competitions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&env.server)
        .await;
    env.mount_listing(
        "Chile",
        listing_html(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago")]),
    )
    .await;
    let session = Session::new("Chile", "en");

    assert!(env.monitor.run_cycle(&session, date(2024, 6, 1)).await.is_err());

    let report = env.monitor.run_cycle(&session, date(2024, 6, 1)).await.unwrap();
    assert_eq!(report.new, 1);
    assert_eq!(env.channel.deliveries().len(), 1);
}

#[tokio::test]
async fn test_country_feed_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let crawler = cubewatch::crawler::Crawler::new(&config).unwrap();
    assert!(crawler.fetch_current("Chile").await.is_err());
}

#[tokio::test]
async fn test_malformed_dates_skipped() {
    let env = TestEnv::start().await;
    env.mount_listing(
        "Chile",
        listing_html(&[
            ("GoodOne2024", "Jun 10 - 12, 2024", "Chile, Santiago"),
            ("NoDate2024", "", "Chile, Santiago"),
            ("BadMonth2024", "Foo 10, 2024", "Chile, Santiago"),
            ("CrossMonth2024", "Jun 30 - Jul 1, 2024", "Chile, Santiago"),
            ("Reversed2024", "Jun 12 - 10, 2024", "Chile, Santiago"),
            ("Feb30th2024", "Feb 30, 2024", "Chile, Santiago"),
        ]),
    )
    .await;

    let report = env
        .monitor
        .run_cycle(&Session::new("Chile", "en"), date(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.stored, 1);
    assert!(env.store.get(&env.url("GoodOne2024")).unwrap().is_some());
}

#[tokio::test]
async fn test_misaligned_listing_groups() {
    let env = TestEnv::start().await;
    let html = r#"<html><body>
        <span class="competition-info"><a href="/competitions/A2024">A2024</a></span>
        <span class="date">Jun 1, 2024</span>
        <div class="location">Chile, Santiago</div>
        <span class="competition-info"><a href="/competitions/B2024">B2024</a></span>
        <span class="date">Jun 2, 2024</span>
    </body></html>"#;
    env.mount_listing("Chile", html.to_string()).await;

    let outcome = env.monitor.query(&Session::new("Chile", "en")).await;
    assert_eq!(outcome.competitions().len(), 1);
    assert_eq!(outcome.competitions()[0].name, "A2024");
}

#[tokio::test]
async fn test_query_failure_is_generic() {
    let env = TestEnv::start().await;
    Mock::given(method("GET"))
        .and(path("/competitions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream trace id 1234"))
        .mount(&env.server)
        .await;

    let session = Session::new("Chile", "en");
    let outcome = env.monitor.query(&session).await;
    assert!(matches!(outcome, QueryOutcome::Failed));

    let page = env.monitor.render_page(&outcome, 0, "en");
    let text = page.to_text();
    assert_eq!(text, env.monitor.formatter().fetch_failed("en"));
    assert!(!text.contains("502"));
    assert!(!text.contains("trace"));
}

#[tokio::test]
async fn test_unknown_country_falls_back() {
    let env = TestEnv::start().await;
    env.mount_listing(
        "Chile",
        listing_html(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago")]),
    )
    .await;

    let outcome = env.monitor.query(&Session::new("Zzzxx", "en")).await;
    match outcome {
        QueryOutcome::Found { resolution, competitions } => {
            assert!(resolution.is_fallback());
            assert_eq!(resolution.display_name(), "Chile");
            assert_eq!(competitions.len(), 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_duplicate_insert_reported() {
    let store = SqliteCompetitionRepository::in_memory().unwrap();
    let c = Competition {
        name: "A".to_string(),
        url: "https://www.worldcubeassociation.org/competitions/A".to_string(),
        start_date: date(2024, 6, 1),
        end_date: date(2024, 6, 1),
        country: "Chile".to_string(),
        location: "Santiago".to_string(),
    };

    store.insert(&c).unwrap();
    let report = store.insert_all(&[c.clone(), c]);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.already_present, 2);
    assert!(!report.has_failures());
}

#[test]
fn test_store_error_categories() {
    let err: Error = StoreError::Corrupt {
        column: "end_date",
        value: "yesterday".to_string(),
    }
    .into();
    assert_eq!(err.category(), ErrorCategory::Storage);
    assert!(!err.is_recoverable());
}
