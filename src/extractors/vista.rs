//! The Vista Theater. Listings live on the Veezi ticketing site: titles are
//! plain `h2/h3/h4` headings and each heading's direct parent holds the
//! session's date ("Thursday 22, January") and time.

use crate::constants::VISTA;
use crate::error::Result;
use crate::extractors::{absolutize, ancestor, text_joined, text_spaced};
use crate::normalize::{self, DateFormat};
use crate::types::{Event, PageSource, VenueConfig, VenueExtractor};
use chrono::Datelike;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

const TICKETING_HOST: &str = "https://ticketing.uswest.veezi.com";

const CONFIG: VenueConfig = VenueConfig {
    key: VISTA,
    venue_name: "The Vista Theater",
    venue_short: "Vista",
    event_type: "film",
    listing_url: "https://ticketing.uswest.veezi.com/sessions/?siteToken=20xhpa3yt2hhkwt4zjvfcwsaww",
    default_event_url:
        "https://ticketing.uswest.veezi.com/sessions/?siteToken=20xhpa3yt2hhkwt4zjvfcwsaww",
    ancestor_depth: 1,
    noise_terms: &["select", "choose", "tickets", "sessions", "showtimes", "book now"],
    date_formats: &[DateFormat::DayThenMonth],
    max_pages: 1,
};

pub struct VistaExtractor {
    config: VenueConfig,
}

impl Default for VistaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl VistaExtractor {
    pub fn new() -> Self {
        Self { config: CONFIG }
    }

    fn scan_document(&self, document: &Html) -> Vec<Event> {
        let headings = Selector::parse("h2, h3, h4").unwrap();
        let year = chrono::Utc::now().year();
        let mut events = Vec::new();

        for heading in document.select(&headings) {
            let title = text_joined(heading);
            if title.len() < 3 {
                continue;
            }
            let lower = title.to_lowercase();
            // the venue's own byline shows up as a heading too
            if lower.contains("vista") && lower.contains("theater") {
                continue;
            }
            // date headers like "Thursday 22, January" are section separators
            if normalize::starts_with_weekday(&lower) {
                continue;
            }
            if self.config.noise_terms.iter().any(|term| lower.contains(term)) {
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

            let url = self.purchase_link(card);
            events.push(self.config.event(title, date, time, Some(url)));
        }

        events
    }

    fn purchase_link(&self, card: scraper::ElementRef) -> String {
        let anchors = Selector::parse("a[href]").unwrap();
        for anchor in card.select(&anchors) {
            let href = anchor.value().attr("href").unwrap_or("");
            if href.contains("purchase") || href.contains("siteToken") {
                return absolutize(TICKETING_HOST, href);
            }
        }
        self.config.default_event_url.to_string()
    }
}

#[async_trait::async_trait]
impl VenueExtractor for VistaExtractor {
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
