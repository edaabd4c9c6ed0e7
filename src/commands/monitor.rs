use anyhow::Result;
use std::sync::Arc;

use cubewatch::models::Session;
use cubewatch::scheduler::{CycleTrigger, TriggerConfig};

use super::App;

/// Run cycles on the configured interval until Ctrl-C
pub async fn run(app: &App, session: Session) -> Result<()> {
    println!("cubewatch monitor");
    println!("=================");
    println!("  Country: {}", session.country);
    println!("  Locale: {}", session.locale);
    println!("  Interval: {}s", app.config.scheduler.interval_secs);
    println!("  Channel: {}", app.monitor.channel_name());
    println!();

    let trigger = CycleTrigger::new(
        TriggerConfig::from(&app.config.scheduler),
        Arc::clone(&app.monitor),
        session,
    )?;
    trigger.start().await?;

    let status = trigger.status().await;
    println!(
        "Stopped after {} cycle(s), {} failed",
        status.cycles_run, status.cycles_failed
    );
    Ok(())
}

/// Run a single cycle and print its report
pub async fn check(app: &App, session: Session) -> Result<()> {
    let report = app.monitor.run_cycle_now(&session).await?;

    println!("Cycle for {}", report.country);
    println!("  Purged:  {}", report.purged);
    println!("  Fetched: {}", report.fetched);
    println!("  New:     {}", report.new);
    println!("  Stored:  {}", report.stored);
    for url in &report.failed {
        println!("  Failed:  {url}");
    }
    match &report.delivery {
        Some(status) => println!("  Delivery: {status}"),
        None => println!("  Delivery: nothing to announce"),
    }
    Ok(())
}
