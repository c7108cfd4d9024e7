use crate::error::Result;
use crate::normalize::DateFormat;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One screening, as persisted to the aggregated events feed.
///
/// Records are created by a venue extractor and never mutated afterwards.
/// Field names on the wire match the published feed (`venueShort`, `type`);
/// an absent `url` round-trips losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub venue: String,
    #[serde(rename = "venueShort")]
    pub venue_short: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Canonical `YYYY-MM-DD`
    pub date: String,
    /// Canonical `H:MM AM|PM`
    pub time: String,
    /// Reserved; always empty in the current feed
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Deduplication identity: two records with the same key are the same screening.
pub type EventKey = (String, String, String, String);

impl Event {
    pub fn identity_key(&self) -> EventKey {
        (
            self.title.clone(),
            self.venue.clone(),
            self.date.clone(),
            self.time.clone(),
        )
    }
}

/// Static per-venue configuration. Everything venue-identifying in an emitted
/// record comes from here, never from the scraped page.
pub struct VenueConfig {
    pub key: &'static str,
    pub venue_name: &'static str,
    pub venue_short: &'static str,
    pub event_type: &'static str,
    /// Listing page the extractor scans
    pub listing_url: &'static str,
    /// Fallback event link when no per-event anchor is found
    pub default_event_url: &'static str,
    /// How many ancestor levels to climb from a title node to its card
    pub ancestor_depth: usize,
    /// Lowercased title substrings that mark UI noise, not film titles
    pub noise_terms: &'static [&'static str],
    /// Ordered date patterns tried against card text, first match wins
    pub date_formats: &'static [DateFormat],
    /// Pagination ceiling; 1 for single-page venues
    pub max_pages: usize,
}

impl VenueConfig {
    /// Builds an event record for this venue from extracted fields.
    pub fn event(&self, title: String, date: NaiveDate, time: String, url: Option<String>) -> Event {
        Event {
            title,
            venue: self.venue_name.to_string(),
            venue_short: self.venue_short.to_string(),
            event_type: self.event_type.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            time,
            description: String::new(),
            url,
        }
    }
}

/// Page-acquisition boundary. Implementations own navigation, rendering
/// waits and pacing; the extraction pipeline never sleeps itself.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the fully rendered document at `url`.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Fetch page `page` (1-based) of a paginated listing.
    /// `None` signals that no further pages exist.
    async fn fetch_listing_page(&self, url: &str, page: usize) -> Result<Option<String>>;
}

/// Core trait implemented once per venue.
#[async_trait]
pub trait VenueExtractor: Send + Sync {
    fn config(&self) -> &VenueConfig;

    /// Produce every event currently listed by this venue. Candidate-level
    /// parse failures are skipped internally; an `Err` here means the venue
    /// as a whole could not be scraped.
    async fn extract_events(&self, source: &dyn PageSource) -> Result<Vec<Event>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(url: Option<String>) -> Event {
        Event {
            title: "Chinatown".to_string(),
            venue: "The Vista Theater".to_string(),
            venue_short: "Vista".to_string(),
            event_type: "film".to_string(),
            date: "2025-06-01".to_string(),
            time: "7:15 PM".to_string(),
            description: String::new(),
            url,
        }
    }

    #[test]
    fn test_event_serializes_with_feed_field_names() {
        let json = serde_json::to_value(sample_event(Some("https://example.com/e/1".into()))).unwrap();
        assert_eq!(json["venueShort"], "Vista");
        assert_eq!(json["type"], "film");
        assert_eq!(json["url"], "https://example.com/e/1");
    }

    #[test]
    fn test_missing_url_round_trips() {
        let json = serde_json::to_string(&sample_event(None)).unwrap();
        assert!(!json.contains("\"url\""));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_event(None));
    }

    #[test]
    fn test_identity_key_ignores_url_and_description() {
        let a = sample_event(None);
        let b = sample_event(Some("https://example.com/other".into()));
        assert_eq!(a.identity_key(), b.identity_key());
    }
}
