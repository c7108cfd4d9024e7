//! Vidiots. Movie titles are `h2` headings on the coming-soon page; the full
//! card sits two wrapper levels up and shows abbreviated dates ("Sat, Jan 24").
//! A card without a parseable showtime is not a screening yet.

use crate::constants::VIDIOTS;
use crate::error::Result;
use crate::extractors::{absolutize, ancestor, text_joined, text_spaced};
use crate::normalize::{self, DateFormat};
use crate::types::{Event, PageSource, VenueConfig, VenueExtractor};
use chrono::Datelike;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

const VENUE_HOST: &str = "https://vidiotsfoundation.org";

const CONFIG: VenueConfig = VenueConfig {
    key: VIDIOTS,
    venue_name: "Vidiots",
    venue_short: "Vidiots",
    event_type: "film",
    listing_url: "https://vidiotsfoundation.org/coming-soon/",
    default_event_url: "https://vidiotsfoundation.org/coming-soon/",
    ancestor_depth: 2,
    noise_terms: &["coming soon to vidiots"],
    date_formats: &[DateFormat::WeekdayAbbrevMonthDay],
    max_pages: 1,
};

pub struct VidiotsExtractor {
    config: VenueConfig,
}

impl Default for VidiotsExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl VidiotsExtractor {
    pub fn new() -> Self {
        Self { config: CONFIG }
    }

    fn scan_document(&self, document: &Html) -> Vec<Event> {
        let headings = Selector::parse("h2").unwrap();
        let year = chrono::Utc::now().year();
        let mut events = Vec::new();

        for heading in document.select(&headings) {
            let title = text_joined(heading);
            if title.len() < 3 {
                continue;
            }
            // only the page header is noise here; h2 is otherwise a film title
            let lower = title.to_lowercase();
            if self.config.noise_terms.iter().any(|term| lower == *term) {
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
            let Some(time) = normalize::find_time(&card_text) else {
                continue;
            };

            let url = self.ticket_link(card);
            events.push(self.config.event(title, date, time, Some(url)));
        }

        events
    }

    fn ticket_link(&self, card: scraper::ElementRef) -> String {
        let anchors = Selector::parse("a[href]").unwrap();
        for anchor in card.select(&anchors) {
            let href = anchor.value().attr("href").unwrap_or("");
            if href.contains("purchase") || href.to_lowercase().contains("ticket") {
                return absolutize(VENUE_HOST, href);
            }
        }
        self.config.default_event_url.to_string()
    }
}

#[async_trait::async_trait]
impl VenueExtractor for VidiotsExtractor {
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
