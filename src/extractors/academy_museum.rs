//! Academy Museum. The calendar is paginated (`&page=N`) and every screening
//! is announced by a `ShowtimeText` paragraph shaped
//! `"Feb 6, 2026 | 2:30pm | 4K DCP"`. The film title is the second
//! program-detail link in the enclosing card (the first wraps the still),
//! found by a bounded upward walk. Titles need two repairs: the render joins
//! text runs without spaces ("…Ozin 4K"), and some cards append promotional
//! copy ("In person: …", "Selected by …") that is not part of the title.

use crate::constants::ACADEMY_MUSEUM;
use crate::error::Result;
use crate::extractors::{find_container, text_joined};
use crate::normalize::{self, DateFormat};
use crate::types::{Event, PageSource, VenueConfig, VenueExtractor};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

const PROGRAM_DETAIL_PATH: &str = "/programs/detail/";
const TITLE_WALK_DEPTH: usize = 10;

const CONFIG: VenueConfig = VenueConfig {
    key: ACADEMY_MUSEUM,
    venue_name: "Academy Museum",
    venue_short: "Academy",
    event_type: "film",
    listing_url:
        "https://www.academymuseum.org/en/calendar?locale=en&programTypes=16i3uOYQwism7sMDhIQr2O",
    default_event_url: "https://www.academymuseum.org/en/calendar?programTypes=16i3uOYQwism7sMDhIQr2O",
    ancestor_depth: TITLE_WALK_DEPTH,
    noise_terms: &["screenings", "in person:", "special guest"],
    date_formats: &[DateFormat::AbbrevMonthDayYear],
    max_pages: 10,
};

/// "Feb 6, 2026 | 2:30pm | 4K DCP" — minutes optional
static SHOWTIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{1,2}),\s+(\d{4})\s*\|\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm)",
    )
    .unwrap()
});

/// Repairs the missing space before a trailing format tag: "Ozin 4K" → "Oz in 4K"
static FORMAT_TAG_JOIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w)(in\s+(?:4K|35mm|DCP|Dolby Vision|Dolby Atmos|IMAX|70mm))").unwrap()
});

pub struct AcademyMuseumExtractor {
    config: VenueConfig,
}

impl Default for AcademyMuseumExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AcademyMuseumExtractor {
    pub fn new() -> Self {
        Self { config: CONFIG }
    }

    /// Scans one calendar page. Returns the number of showtime nodes seen
    /// (zero means we paged past the end) alongside the parsed events.
    fn scan_page(&self, document: &Html) -> (usize, Vec<Event>) {
        let showtimes = Selector::parse(r#"p[class*="ShowtimeText"]"#).unwrap();
        let mut events = Vec::new();
        let mut seen = 0;

        for showtime in document.select(&showtimes) {
            seen += 1;
            let text = text_joined(showtime);
            let Some((date, time)) = parse_showtime(&text) else {
                continue;
            };
            let Some(title) = self.find_title(showtime) else {
                continue;
            };
            events.push(self.config.event(
                title,
                date,
                time,
                Some(self.config.default_event_url.to_string()),
            ));
        }

        (seen, events)
    }

    /// Walks up from the showtime node until a container holds program-detail
    /// links; the second link's text is the title (the first is the still's
    /// caption), a lone link is taken as-is.
    fn find_title(&self, showtime: ElementRef) -> Option<String> {
        let anchors = Selector::parse("a[href]").unwrap();
        let card = find_container(showtime, self.config.ancestor_depth, |el| {
            el.select(&anchors)
                .filter(|a| {
                    a.value()
                        .attr("href")
                        .is_some_and(|h| h.contains(PROGRAM_DETAIL_PATH))
                })
                .count()
                >= 1
        })?;

        let links: Vec<ElementRef> = card
            .select(&anchors)
            .filter(|a| {
                a.value()
                    .attr("href")
                    .is_some_and(|h| h.contains(PROGRAM_DETAIL_PATH))
            })
            .collect();
        let title_link = if links.len() >= 2 { links[1] } else { *links.first()? };

        let title = text_joined(title_link);
        if title.is_empty() {
            return None;
        }
        Some(self.clean_title(&title))
    }

    fn clean_title(&self, raw: &str) -> String {
        let mut title = FORMAT_TAG_JOIN.replace_all(raw, "${1} ${2}").into_owned();

        let lower = title.to_lowercase();
        if self.config.noise_terms.iter().any(|term| lower.contains(term)) {
            for marker in ["In person", "Selected by"] {
                if let Some(idx) = title.find(marker) {
                    title.truncate(idx);
                }
            }
        }
        title.trim().to_string()
    }
}

fn parse_showtime(text: &str) -> Option<(NaiveDate, String)> {
    let caps = SHOWTIME.captures(text)?;
    let month = normalize::month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let hour: u32 = caps[4].parse().ok()?;
    let minutes = caps.get(5).map_or("00", |m| m.as_str());
    Some((date, normalize::format_clock(hour, minutes, &caps[6])))
}

#[async_trait::async_trait]
impl VenueExtractor for AcademyMuseumExtractor {
    fn config(&self) -> &VenueConfig {
        &self.config
    }

    #[instrument(skip(self, source))]
    async fn extract_events(&self, source: &dyn PageSource) -> Result<Vec<Event>> {
        info!("Fetching events from {}", self.config.venue_name);
        let mut all_events = Vec::new();

        for page in 1..=self.config.max_pages {
            let Some(body) = source
                .fetch_listing_page(self.config.listing_url, page)
                .await?
            else {
                break;
            };
            let (showtimes, events) = {
                let document = Html::parse_document(&body);
                self.scan_page(&document)
            };
            debug!("Page {}: {} showtime nodes, {} events", page, showtimes, events.len());
            if showtimes == 0 {
                debug!("No showtimes on page {}, stopping pagination", page);
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
