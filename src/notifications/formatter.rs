//! Competition messages with translated labels
//!
//! Every label goes through [`Translations`], so a missing key renders as a
//! placeholder instead of failing the notification.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::i18n::Translations;
use crate::models::Competition;
use crate::notifications::pagination::Paginator;
use crate::notifications::{Field, Message};

/// Date layout used in every message
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Builds messages for new and current competitions
#[derive(Clone)]
pub struct NotificationFormatter {
    translations: Arc<Translations>,
}

impl NotificationFormatter {
    pub fn new(translations: Arc<Translations>) -> Self {
        Self { translations }
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    fn t(&self, locale: &str, key: &str) -> String {
        self.translations.translate(locale, key)
    }

    /// One block per competition
    pub fn format(&self, competitions: &[Competition], locale: &str) -> Vec<Message> {
        competitions
            .iter()
            .map(|c| Message {
                title: Some(c.name.clone()),
                url: Some(c.url.clone()),
                fields: self.detail_fields(c, locale),
                ..Default::default()
            })
            .collect()
    }

    /// Single numbered text message covering every competition
    pub fn format_combined(&self, competitions: &[Competition], locale: &str) -> String {
        competitions
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut lines = vec![format!("{}. {} {}", i + 1, self.t(locale, "Name"), c.name)];
                lines.extend(
                    self.date_fields(c, locale)
                        .into_iter()
                        .map(|f| format!("{}: {}", f.name, f.value)),
                );
                lines.push(format!("{}: {}", self.t(locale, "Location"), c.location));
                lines.push(c.url.clone());
                lines.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Header for a new-competitions delivery
    pub fn format_announcement(&self, count: usize, locale: &str, mention: Option<&str>) -> String {
        let label = self.t(locale, "NewCompetitions");
        match mention {
            Some(mention) if !mention.trim().is_empty() => {
                format!("{} {label} ({count})", mention.trim())
            }
            _ => format!("{label} ({count})"),
        }
    }

    /// Current-competitions view for the page selected by `paginator`
    ///
    /// `competitions` is the full list; the paginator picks the slice.
    pub fn format_page(
        &self,
        competitions: &[Competition],
        paginator: &Paginator,
        country: &str,
        locale: &str,
    ) -> Message {
        let title = format!("{} {country}", self.t(locale, "CurrentCompetitions"));

        if competitions.is_empty() {
            return Message {
                title: Some(title),
                description: Some(self.no_competitions(locale)),
                ..Default::default()
            };
        }

        let mut fields = Vec::new();
        for c in paginator.page_slice(competitions) {
            fields.push(Field::new(c.name.clone(), c.url.clone(), false));
            fields.extend(self.detail_fields(c, locale));
        }

        let page = paginator.page_number().to_string();
        let total = paginator.total_pages().to_string();
        Message {
            title: Some(title),
            fields,
            footer: Some(self.translations.translate_with(
                locale,
                "Page",
                &[("page", &page), ("total", &total)],
            )),
            ..Default::default()
        }
    }

    /// Translated labels of the enabled navigation controls, `None` on a single page
    pub fn format_controls(&self, paginator: &Paginator, locale: &str) -> Option<String> {
        let labels: Vec<String> = paginator
            .enabled_controls()
            .into_iter()
            .map(|c| self.t(locale, c.label_key()))
            .collect();
        (!labels.is_empty()).then(|| labels.join(" | "))
    }

    /// Text shown when a query finds nothing
    pub fn no_competitions(&self, locale: &str) -> String {
        self.t(locale, "NoCompetitionFound")
    }

    /// Text shown when the listing could not be fetched
    pub fn fetch_failed(&self, locale: &str) -> String {
        self.t(locale, "FetchFailed")
    }

    /// Location plus one or two date fields
    fn detail_fields(&self, c: &Competition, locale: &str) -> Vec<Field> {
        let mut fields = vec![Field::new(self.t(locale, "Location"), c.location.clone(), true)];
        fields.extend(self.date_fields(c, locale));
        fields
    }

    /// `Date` for single-day events, `StartDate` and `EndDate` otherwise
    fn date_fields(&self, c: &Competition, locale: &str) -> Vec<Field> {
        if c.is_single_day() {
            vec![Field::new(self.t(locale, "Date"), display_date(c.start_date), true)]
        } else {
            vec![
                Field::new(self.t(locale, "StartDate"), display_date(c.start_date), true),
                Field::new(self.t(locale, "EndDate"), display_date(c.end_date), true),
            ]
        }
    }
}

/// `dd/mm/YYYY`
pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}
