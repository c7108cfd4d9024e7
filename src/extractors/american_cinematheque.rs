//! American Cinematheque at Los Feliz 3. Event cards are marked by their
//! "View Event Details" links rather than by heading structure, and the most
//! reliable source of the showtime is the event URL itself, whose slug ends
//! in `-M-D-YY[-HHMMam|pm]`. Card text is only a fallback: the listing
//! markup nests deeply and headings are frequently dates, not titles.

use crate::constants::AMERICAN_CINEMATHEQUE;
use crate::error::Result;
use crate::extractors::{absolutize, find_container, text_joined, text_spaced};
use crate::normalize::{self, DateFormat};
use crate::types::{Event, PageSource, VenueConfig, VenueExtractor};
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

const VENUE_HOST: &str = "https://www.americancinematheque.com";
const CARD_WALK_DEPTH: usize = 10;
const DEFAULT_SHOWTIME: &str = "7:30 PM";

const CONFIG: VenueConfig = VenueConfig {
    key: AMERICAN_CINEMATHEQUE,
    venue_name: "American Cinematheque at Los Feliz 3",
    venue_short: "Los Feliz 3",
    event_type: "film",
    listing_url: "https://www.americancinematheque.com/now-showing/?event_location=102&view_type=list",
    default_event_url: "https://www.americancinematheque.com/now-showing/",
    ancestor_depth: CARD_WALK_DEPTH,
    noise_terms: &["view event"],
    date_formats: &[
        DateFormat::MonthDayYear,
        DateFormat::AbbrevMonthDayYear,
        DateFormat::WeekdayAbbrevMonthDay,
        DateFormat::MonthDay,
    ],
    max_pages: 10,
};

static MONTH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)").unwrap());

/// Headings that are dates, weekdays or bare numbers are schedule chrome
static DATE_LIKE_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun|Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec|\d)").unwrap()
});

static SLUG_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/now-showing/([^/]+)/?$").unwrap());

static SLUG_DATE_SUFFIX_WITH_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-\d{1,2}-\d{1,2}-\d{2,4}-\d{1,4}(?:am|pm)?$").unwrap());

static SLUG_DATE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d{1,2}-\d{1,2}-\d{2,4}$").unwrap());

static EP_ABBREV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bEp\b").unwrap());

pub struct AmericanCinemathequeExtractor {
    config: VenueConfig,
}

impl Default for AmericanCinemathequeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AmericanCinemathequeExtractor {
    pub fn new() -> Self {
        Self { config: CONFIG }
    }

    /// Scans one listing page. Returns how many event links were present
    /// (before dedup against `seen_urls`) alongside the new events.
    fn scan_page(&self, document: &Html, seen_urls: &mut HashSet<String>) -> (usize, Vec<Event>) {
        let links = self.event_links(document);
        let link_count = links.len();
        let year = chrono::Utc::now().year();
        let mut events = Vec::new();

        for link in links {
            let href = link.value().attr("href").unwrap_or("");
            if href.is_empty() || href.contains("event_location=") {
                continue;
            }
            let event_url = absolutize(VENUE_HOST, href);
            if !seen_urls.insert(event_url.clone()) {
                continue;
            }

            let card = find_container(link, self.config.ancestor_depth, |el| {
                has_heading(el) && MONTH_TOKEN.is_match(&text_spaced(el))
            });
            let Some(card) = card else {
                continue;
            };
            let card_text = text_spaced(card);

            let Some(title) = self
                .heading_title(card)
                .or_else(|| slug_title(href))
            else {
                continue;
            };

            // URL-first: the slug encodes the showtime more reliably than
            // the free-form card text
            let (date, slug_time) = match normalize::parse_slug_datetime(href) {
                Some((date, time)) => (Some(date), time),
                None => (None, None),
            };
            let date = match date {
                Some(date) => date,
                None => {
                    debug!("Slug date not matched for {}, falling back to card text", href);
                    match normalize::find_date(&card_text, self.config.date_formats, year) {
                        Some(date) => date,
                        None => continue,
                    }
                }
            };
            let time = slug_time
                .or_else(|| normalize::find_time(&card_text))
                .unwrap_or_else(|| DEFAULT_SHOWTIME.to_string());

            events.push(self.config.event(title, date, time, Some(event_url)));
        }

        (link_count, events)
    }

    /// "View Event Details" anchors mark the cards; fall back to anchors
    /// into /now-showing/ that are not navigation.
    fn event_links<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let anchors = Selector::parse("a[href]").unwrap();
        let labeled: Vec<ElementRef> = document
            .select(&anchors)
            .filter(|a| text_joined(*a).to_lowercase().contains("view event"))
            .collect();
        if !labeled.is_empty() {
            return labeled;
        }

        document
            .select(&anchors)
            .filter(|a| {
                let href = a.value().attr("href").unwrap_or("");
                href.contains("/now-showing/")
                    && !href.contains('?')
                    && !href.trim_end_matches('/').ends_with("/now-showing")
            })
            .collect()
    }

    fn heading_title(&self, card: ElementRef) -> Option<String> {
        let headings = Selector::parse("h1, h2, h3, h4, h5").unwrap();
        for heading in card.select(&headings) {
            let text = text_joined(heading);
            if text.len() <= 2 {
                continue;
            }
            let lower = text.to_lowercase();
            if self.config.noise_terms.iter().any(|term| lower.contains(term)) {
                continue;
            }
            if DATE_LIKE_HEADING.is_match(&text) {
                continue;
            }
            return Some(text);
        }
        None
    }
}

fn has_heading(el: ElementRef) -> bool {
    let headings = Selector::parse("h1, h2, h3, h4, h5").unwrap();
    el.select(&headings).next().is_some()
}

/// Rebuilds a title from the URL slug when the card has no usable heading:
/// strip the date suffix, dashes to spaces, title case, "Ep" → "Ep.".
fn slug_title(href: &str) -> Option<String> {
    let slug = SLUG_SEGMENT.captures(href)?.get(1)?.as_str();
    let slug = SLUG_DATE_SUFFIX_WITH_TIME.replace(slug, "");
    let slug = SLUG_DATE_SUFFIX.replace(&slug, "");

    let words: Vec<String> = slug
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(EP_ABBREV.replace_all(&words.join(" "), "Ep.").into_owned())
}

#[async_trait::async_trait]
impl VenueExtractor for AmericanCinemathequeExtractor {
    fn config(&self) -> &VenueConfig {
        &self.config
    }

    #[instrument(skip(self, source))]
    async fn extract_events(&self, source: &dyn PageSource) -> Result<Vec<Event>> {
        info!("Fetching events from {}", self.config.venue_name);
        let mut seen_urls = HashSet::new();
        let mut all_events = Vec::new();

        for page in 1..=self.config.max_pages {
            let Some(body) = source
                .fetch_listing_page(self.config.listing_url, page)
                .await?
            else {
                break;
            };
            let (link_count, events) = {
                let document = Html::parse_document(&body);
                self.scan_page(&document, &mut seen_urls)
            };
            debug!("Page {}: {} event links, {} new events", page, link_count, events.len());
            if link_count == 0 || events.is_empty() {
                break;
            }
            all_events.extend(events);
        }

        info!(
            "Parsed {} events from {}",
            all_events.len(),
            self.config.venue_name
        );
        if all_events.is_empty() {
            warn!("No events found - the page structure may have changed");
        }
        Ok(all_events)
    }
}
