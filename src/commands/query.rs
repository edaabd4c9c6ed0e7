use anyhow::Result;

use cubewatch::crawler::MatchKind;
use cubewatch::models::Session;

use super::App;

/// Print one page of current competitions (page numbers start at 1)
pub async fn list(app: &App, session: Session, page: usize) -> Result<()> {
    let outbound = app.monitor.page(&session, page.saturating_sub(1)).await;
    for block in &outbound.blocks {
        println!("{}", block.to_text());
    }
    if let Some(navigation) = &outbound.content {
        println!("{navigation}");
    }
    Ok(())
}

/// Show how a country input resolves
pub async fn resolve(app: &App, session: Session, input: &str) -> Result<()> {
    let resolution = app.monitor.crawler().resolver().resolve(input).await?;

    if resolution.is_fallback() {
        println!("{}", app.translations.translate(&session.locale, "InvalidCountry"));
    }

    let how = match resolution.kind {
        MatchKind::Name => "name".to_string(),
        MatchKind::Code => "ISO code".to_string(),
        MatchKind::Fuzzy(score) => format!("approximate ({score:.2})"),
        MatchKind::Fallback => "default".to_string(),
    };
    println!("{input} -> {} [{}] via {how}", resolution.display_name(), resolution.name);
    Ok(())
}

/// List supported locales
pub fn languages(app: &App, session: &Session) -> Result<()> {
    println!(
        "{}:",
        app.translations.translate(&session.locale, "AvailableLanguages")
    );
    for (code, name) in app.translations.languages() {
        let marker = if *code == session.locale { "*" } else { " " };
        println!(" {marker} {code:<4} {name}");
    }
    Ok(())
}
