//! The New Beverly Theater. Titles are `h4` headings inside a schedule card
//! two wrapper levels up; dates carry a weekday prefix ("Fri, January 23")
//! and a missing showtime defaults to the house 7:30 PM slot.

use crate::constants::NEW_BEVERLY;
use crate::error::Result;
use crate::extractors::{absolutize, ancestor, enclosing_anchor, text_joined, text_spaced};
use crate::normalize::{self, DateFormat};
use crate::types::{Event, PageSource, VenueConfig, VenueExtractor};
use chrono::Datelike;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

const VENUE_HOST: &str = "https://thenewbev.com";
const DEFAULT_SHOWTIME: &str = "7:30 PM";

const CONFIG: VenueConfig = VenueConfig {
    key: NEW_BEVERLY,
    venue_name: "The New Beverly Theater",
    venue_short: "New Bev",
    event_type: "film",
    listing_url: "https://thenewbev.com/schedule/",
    default_event_url: "https://thenewbev.com/schedule/",
    ancestor_depth: 3,
    noise_terms: &[],
    date_formats: &[DateFormat::WeekdayMonthDay],
    max_pages: 1,
};

pub struct NewBeverlyExtractor {
    config: VenueConfig,
}

impl Default for NewBeverlyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl NewBeverlyExtractor {
    pub fn new() -> Self {
        Self { config: CONFIG }
    }

    fn scan_document(&self, document: &Html) -> Vec<Event> {
        let headings = Selector::parse("h4").unwrap();
        let year = chrono::Utc::now().year();
        let mut events = Vec::new();

        for heading in document.select(&headings) {
            let title = text_joined(heading);
            if title.len() < 3 {
                continue;
            }

            let Some(card) = ancestor(heading, self.config.ancestor_depth) else {
                continue;
            };
            let card_text = text_spaced(card);

            let Some(date) = normalize::find_date(&card_text, self.config.date_formats, year)
            else {
                continue;
            };
            let time = normalize::find_time(&card_text)
                .unwrap_or_else(|| DEFAULT_SHOWTIME.to_string());

            let url = self.event_link(heading, card);
            events.push(self.config.event(title, date, time, Some(url)));
        }

        events
    }

    /// Prefer an anchor wrapping the title itself; otherwise the first
    /// program/event link inside the card; otherwise the schedule page.
    fn event_link(&self, heading: scraper::ElementRef, card: scraper::ElementRef) -> String {
        if let Some(href) = enclosing_anchor(heading) {
            return absolutize(VENUE_HOST, &href);
        }
        let anchors = Selector::parse("a[href]").unwrap();
        for anchor in card.select(&anchors) {
            let href = anchor.value().attr("href").unwrap_or("");
            if href.contains("program") || href.contains("event") {
                return absolutize(VENUE_HOST, href);
            }
        }
        self.config.default_event_url.to_string()
    }
}

#[async_trait::async_trait]
impl VenueExtractor for NewBeverlyExtractor {
    fn config(&self) -> &VenueConfig {
        &self.config
    }

    #[instrument(skip(self, source))]
    async fn extract_events(&self, source: &dyn PageSource) -> Result<Vec<Event>> {
        info!("Fetching events from {}", self.config.venue_name);
        let body = source.fetch_page(self.config.listing_url).await?;
        let events = self.scan_document(&Html::parse_document(&body));
        info!("Parsed {} events from {}", events.len(), self.config.venue_name);
        if events.is_empty() {
            warn!("No events found - the page structure may have changed");
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{}</body></html>", body))
    }

    #[test]
    fn test_scan_uses_title_anchor_when_present() {
        let year = chrono::Utc::now().year();
        let html = page(
            r#"<div class="card">
                 <div><a href="/films/double-feature"><h4>Jackie Brown</h4></a></div>
                 <p>Fri, January 23</p>
                 <p>7:30 pm &amp; 10:45 pm</p>
               </div>"#,
        );

        let events = NewBeverlyExtractor::new().scan_document(&html);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Jackie Brown");
        assert_eq!(events[0].date, format!("{}-01-23", year));
        assert_eq!(events[0].time, "7:30 PM");
        assert_eq!(
            events[0].url.as_deref(),
            Some("https://thenewbev.com/films/double-feature")
        );
    }

    #[test]
    fn test_scan_defaults_missing_showtime() {
        let html = page(
            r#"<div><div><div><h4>Kill Bill</h4></div><p>Sat, January 24</p></div></div>"#,
        );
        let events = NewBeverlyExtractor::new().scan_document(&html);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, "7:30 PM");
    }

    #[test]
    fn test_scan_requires_weekday_prefixed_date() {
        // a bare "January 23" is a calendar header, not a card date
        let html = page(r#"<div><div><div><h4>Pulp Fiction</h4></div><p>January 23</p></div></div>"#);
        assert!(NewBeverlyExtractor::new().scan_document(&html).is_empty());
    }

    #[test]
    fn test_scan_finds_program_link_in_card() {
        let html = page(
            r#"<div>
                 <div><div><h4>Death Proof</h4></div>
                 <p>Sun, January 25 7:30 pm</p>
                 <a href="https://thenewbev.com/program/death-proof">details</a></div>
               </div>"#,
        );
        let events = NewBeverlyExtractor::new().scan_document(&html);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].url.as_deref(),
            Some("https://thenewbev.com/program/death-proof")
        );
    }
}
