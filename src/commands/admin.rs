use anyhow::Result;
use chrono::NaiveDate;

use super::App;

/// Remove one stored competition
pub async fn delete(app: &App, url: &str) -> Result<()> {
    if app.monitor.delete(url).await? {
        println!("Deleted {url}");
    } else {
        println!("Not stored: {url}");
    }
    Ok(())
}

/// Remove stored competitions that ended before `as_of` (default today)
pub async fn purge(app: &App, as_of: Option<NaiveDate>) -> Result<()> {
    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let removed = app.monitor.purge(as_of).await?;
    let remaining = app.monitor.store().count()?;
    println!("Purged {removed} competition(s) ended before {as_of}, {remaining} remaining");
    Ok(())
}
