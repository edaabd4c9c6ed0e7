//! End-to-end cycle tests
//!
//! Resolve → fetch → parse dates → diff → persist → notify, against a mock
//! listing host and a temporary SQLite store.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use cubewatch::models::{Competition, Session};
use cubewatch::parser::parse_date_range;
use cubewatch::pipeline::{diff, MonitorOptions, QueryOutcome};

use super::fixtures::{listing_html, RecordingChannel, TestEnv, EMPTY_LISTING_HTML};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_example_scenario() {
    let env = TestEnv::start().await;
    env.mount_listing(
        "Chile",
        listing_html(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago")]),
    )
    .await;

    // resolve("CL") -> "Chile"
    let resolution = env.monitor.crawler().resolver().resolve("CL").await.unwrap();
    assert_eq!(resolution.display_name(), "Chile");

    // "Jun 10 - 12, 2024" -> 2024-06-10 .. 2024-06-12
    assert_eq!(
        parse_date_range("Jun 10 - 12, 2024").unwrap(),
        (date(2024, 6, 10), date(2024, 6, 12))
    );

    // Empty known set: everything is new
    let session = Session::new("CL", "en");
    let report = env.monitor.run_cycle(&session, date(2024, 6, 1)).await.unwrap();
    assert_eq!(report.new, 1);
    assert_eq!(report.stored, 1);

    let stored = env.store.get(&env.url("SantiagoOpen2024")).unwrap().unwrap();
    assert_eq!(stored.start_date, date(2024, 6, 10));
    assert_eq!(stored.end_date, date(2024, 6, 12));
    assert_eq!(stored.location, "Santiago");
    assert_eq!(stored.country, "Chile");

    // purge_expired(2024-07-01) removes it since end < as_of
    assert_eq!(env.store.purge_expired(date(2024, 7, 1)).unwrap(), 1);
    assert!(env.store.get(&env.url("SantiagoOpen2024")).unwrap().is_none());
}

#[tokio::test]
async fn test_diff_of_single_record_against_empty_known() {
    let c = Competition {
        name: "A".to_string(),
        url: "/a".to_string(),
        start_date: date(2024, 6, 10),
        end_date: date(2024, 6, 12),
        country: "Chile".to_string(),
        location: "Santiago".to_string(),
    };
    assert_eq!(diff(&[c.clone()], &[]), vec![c]);
}

#[tokio::test]
async fn test_repeated_cycles_announce_once() {
    let env = TestEnv::start().await;
    env.mount_listing(
        "Chile",
        listing_html(&[
            ("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago"),
            ("ConcepcionCubing2024", "Jun 22, 2024", "Chile, Concepción"),
        ]),
    )
    .await;
    let session = Session::new("Chile", "es");

    let first = env.monitor.run_cycle(&session, date(2024, 6, 1)).await.unwrap();
    let second = env.monitor.run_cycle(&session, date(2024, 6, 2)).await.unwrap();

    assert_eq!(first.new, 2);
    assert_eq!(second.new, 0);
    assert_eq!(env.store.count().unwrap(), 2);

    let deliveries = env.channel.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(
        deliveries[0].content.as_deref(),
        Some("¡Hay nuevos torneos disponibles! (2)")
    );

    let single_day = &deliveries[0].blocks[1];
    assert_eq!(single_day.title.as_deref(), Some("ConcepcionCubing2024"));
    assert_eq!(single_day.fields[0].value, "Concepción");
    assert_eq!(single_day.fields[1].name, "Fecha");
    assert_eq!(single_day.fields[1].value, "22/06/2024");
}

#[tokio::test]
async fn test_expired_entry_reannounced_after_purge() {
    let env = TestEnv::start().await;
    env.mount_listing(
        "Chile",
        listing_html(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago")]),
    )
    .await;
    let session = Session::new("Chile", "en");

    env.monitor.run_cycle(&session, date(2024, 6, 1)).await.unwrap();
    let report = env.monitor.run_cycle(&session, date(2024, 6, 13)).await.unwrap();

    // Purged first, so the still-listed entry is new again
    assert_eq!(report.purged, 1);
    assert_eq!(report.new, 1);
    assert_eq!(env.channel.deliveries().len(), 2);
}

#[tokio::test]
async fn test_new_entry_among_known() {
    let env = TestEnv::start().await;
    let session = Session::new("Chile", "en");

    env.mount_listing(
        "Chile",
        listing_html(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago")]),
    )
    .await;
    env.monitor.run_cycle(&session, date(2024, 6, 1)).await.unwrap();

    // Swap the listing for one with an extra entry
    env.server.reset().await;
    super::fixtures::mount_countries(&env.server).await;
    env.mount_listing(
        "Chile",
        listing_html(&[
            ("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago"),
            ("TemucoOpen2024", "Jul 6 - 7, 2024", "Chile, Temuco"),
        ]),
    )
    .await;
    let report = env.monitor.run_cycle(&session, date(2024, 6, 2)).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.new, 1);
    let last = env.channel.deliveries().pop().unwrap();
    assert_eq!(last.blocks.len(), 1);
    assert_eq!(last.blocks[0].url, Some(env.url("TemucoOpen2024")));
}

#[tokio::test]
async fn test_combined_delivery() {
    let options = MonitorOptions {
        combined: true,
        ..Default::default()
    };
    let env = TestEnv::with_channel(RecordingChannel::default(), options).await;
    env.mount_listing(
        "New Zealand",
        listing_html(&[("AucklandOpen2024", "Jun 10 - 12, 2024", "New Zealand, Auckland")]),
    )
    .await;

    env.monitor
        .run_cycle(&Session::new("nz", "en"), date(2024, 6, 1))
        .await
        .unwrap();

    let delivery = &env.channel.deliveries()[0];
    assert!(delivery.blocks.is_empty());
    assert_eq!(
        delivery.content.as_deref().unwrap(),
        format!(
            "New competitions are available! (1)\n\n\
             1. Name: AucklandOpen2024\n\
             Start date: 10/06/2024\n\
             End date: 12/06/2024\n\
             Location: Auckland\n\
             {}",
            env.url("AucklandOpen2024")
        )
    );
}

#[tokio::test]
async fn test_rejected_delivery_keeps_records() {
    let env = TestEnv::with_channel(RecordingChannel::rejecting(), MonitorOptions::default()).await;
    env.mount_listing(
        "Chile",
        listing_html(&[("SantiagoOpen2024", "Jun 10 - 12, 2024", "Chile, Santiago")]),
    )
    .await;

    let report = env
        .monitor
        .run_cycle(&Session::new("Chile", "en"), date(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(report.stored, 1);
    assert!(!report.delivered());
    assert_eq!(env.store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_query_pages() {
    let env = TestEnv::start().await;
    env.mount_listing(
        "Chile",
        listing_html(&[
            ("A2024", "Jun 1, 2024", "Chile, Santiago"),
            ("B2024", "Jun 2, 2024", "Chile, Santiago"),
            ("C2024", "Jun 3, 2024", "Chile, Santiago"),
            ("D2024", "Jun 4, 2024", "Chile, Santiago"),
        ]),
    )
    .await;
    let session = Session::new("chile", "en");

    let outcome = env.monitor.query(&session).await;
    assert!(matches!(outcome, QueryOutcome::Found { .. }));
    assert_eq!(outcome.competitions().len(), 4);

    let first = env.monitor.render_page(&outcome, 0, "en");
    assert_eq!(first.blocks[0].title.as_deref(), Some("Current competitions in Chile"));
    assert_eq!(first.blocks[0].footer.as_deref(), Some("Page 1 of 2"));
    assert_eq!(first.content.as_deref(), Some("Next | Last"));

    // Out-of-range page is clamped to the last one
    let last = env.monitor.render_page(&outcome, 9, "en");
    assert_eq!(last.blocks[0].footer.as_deref(), Some("Page 2 of 2"));
    assert_eq!(last.blocks[0].fields[0].name, "D2024");
    assert_eq!(last.content.as_deref(), Some("First | Previous"));

    let spanish = env.monitor.render_page(&outcome, 0, "es");
    assert_eq!(spanish.content.as_deref(), Some("Siguiente | Última"));

    // Queries never write
    assert_eq!(env.store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_query_empty_listing() {
    let env = TestEnv::start().await;
    env.mount_listing("Chile", EMPTY_LISTING_HTML.to_string()).await;

    let page = env.monitor.page(&Session::new("Chile", "en"), 0).await;
    assert_eq!(
        page.blocks[0].description.as_deref(),
        Some("No competitions found.")
    );
}
