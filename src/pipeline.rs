//! The run pipeline: aggregate every venue's extractor output, collapse
//! duplicates in first-seen order, then drop events that have already
//! started. Errors never escape this module; a failed venue contributes
//! zero records and the run continues.

use crate::normalize;
use crate::types::{Event, EventKey, PageSource, VenueExtractor};
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Reference timezone for the future filter: US Pacific as a fixed offset,
/// independent of the execution environment's local time.
const PACIFIC_OFFSET_HOURS: i32 = -8;

/// Events that started less than this many minutes ago are still kept.
const LOOKBACK_MINUTES: u32 = 30;

pub fn pacific_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(PACIFIC_OFFSET_HOURS * 3600).unwrap();
    Utc::now().with_timezone(&offset)
}

/// Runs every configured venue extractor once, in order, and concatenates
/// their output.
pub struct Aggregator {
    extractors: Vec<Box<dyn VenueExtractor>>,
}

impl Aggregator {
    pub fn new(extractors: Vec<Box<dyn VenueExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn venue_count(&self) -> usize {
        self.extractors.len()
    }

    /// A venue-level failure is logged and skipped; it must never abort
    /// extraction for the remaining venues.
    pub async fn collect_events(&self, source: &dyn PageSource) -> Vec<Event> {
        let mut all_events = Vec::new();
        for extractor in &self.extractors {
            let venue = extractor.config().venue_name;
            match extractor.extract_events(source).await {
                Ok(events) => {
                    info!("{}: {} events extracted", venue, events.len());
                    all_events.extend(events);
                }
                Err(e) => {
                    warn!("{}: extraction failed, venue skipped for this run: {}", venue, e);
                }
            }
        }
        all_events
    }
}

/// First-seen-order deduplication on the event identity key. The seen set
/// lives only as long as this instance, keeping successive runs independent.
#[derive(Default)]
pub struct Deduplicator {
    seen: HashSet<EventKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dedup(&mut self, events: Vec<Event>) -> Vec<Event> {
        let mut unique = Vec::with_capacity(events.len());
        for event in events {
            if self.seen.insert(event.identity_key()) {
                unique.push(event);
            }
        }
        unique
    }
}

/// Drops events that have already started, judged against a fixed reference
/// instant. Records whose date or time cannot be parsed are kept: losing
/// data silently is worse than showing a stale item.
pub struct FutureEventFilter {
    now: DateTime<FixedOffset>,
}

impl Default for FutureEventFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FutureEventFilter {
    pub fn new() -> Self {
        Self { now: pacific_now() }
    }

    pub fn with_reference(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    pub fn retain_upcoming(&self, events: Vec<Event>) -> Vec<Event> {
        let today = self.now.date_naive();
        let now_minutes = self.now.hour() * 60 + self.now.minute();
        events
            .into_iter()
            .filter(|event| is_upcoming(event, today, now_minutes))
            .collect()
    }
}

fn is_upcoming(event: &Event, today: NaiveDate, now_minutes: u32) -> bool {
    let event_date = match NaiveDate::parse_from_str(&event.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => return true, // fail open
    };
    if event_date > today {
        return true;
    }
    if event_date < today {
        return false;
    }
    match normalize::time_to_minutes(&event.time) {
        // keep iff the event started less than LOOKBACK_MINUTES ago
        Some(event_minutes) => event_minutes + LOOKBACK_MINUTES > now_minutes,
        None => true, // fail open
    }
}

/// Summary of one complete pipeline run.
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub total_extracted: usize,
    pub duplicates_removed: usize,
    pub past_filtered: usize,
    pub events: Vec<Event>,
}

/// Full pipeline: extract → dedup → future filter. Always returns a result,
/// possibly with an empty event list.
pub async fn run(aggregator: &Aggregator, source: &dyn PageSource) -> PipelineResult {
    let extracted = aggregator.collect_events(source).await;
    let total_extracted = extracted.len();

    let mut deduplicator = Deduplicator::new();
    let unique = deduplicator.dedup(extracted);
    let duplicates_removed = total_extracted - unique.len();

    let before_filter = unique.len();
    let events = FutureEventFilter::new().retain_upcoming(unique);
    let past_filtered = before_filter - events.len();

    info!(
        "Pipeline complete: {} extracted, {} duplicates removed, {} past events filtered, {} upcoming",
        total_extracted,
        duplicates_removed,
        past_filtered,
        events.len()
    );

    PipelineResult {
        total_extracted,
        duplicates_removed,
        past_filtered,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(title: &str, venue: &str, date: &str, time: &str) -> Event {
        Event {
            title: title.to_string(),
            venue: venue.to_string(),
            venue_short: venue.to_string(),
            event_type: "film".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            description: String::new(),
            url: None,
        }
    }

    /// Reference: 2025-01-22 18:00 Pacific
    fn reference_now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(-8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 22, 18, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_dedup_removes_repeats_preserving_first_seen_order() {
        let events = vec![
            event("B", "Vista", "2025-01-22", "7:15 PM"),
            event("A", "Vista", "2025-01-22", "7:15 PM"),
            event("B", "Vista", "2025-01-22", "7:15 PM"),
            event("B", "Vista", "2025-01-23", "7:15 PM"),
        ];

        let unique = Deduplicator::new().dedup(events);
        let titles_dates: Vec<(&str, &str)> = unique
            .iter()
            .map(|e| (e.title.as_str(), e.date.as_str()))
            .collect();
        assert_eq!(
            titles_dates,
            vec![
                ("B", "2025-01-22"),
                ("A", "2025-01-22"),
                ("B", "2025-01-23"),
            ]
        );
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let events = vec![
            event("A", "Vista", "2025-01-22", "7:15 PM"),
            event("A", "Vista", "2025-01-22", "7:15 PM"),
            event("C", "Vidiots", "2025-01-24", "4:00 PM"),
        ];

        let once = Deduplicator::new().dedup(events);
        let twice = Deduplicator::new().dedup(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dedup_keys_are_unique_in_output() {
        let events = vec![
            event("A", "Vista", "2025-01-22", "7:15 PM"),
            event("A", "New Bev", "2025-01-22", "7:15 PM"),
            event("A", "Vista", "2025-01-22", "7:15 PM"),
        ];
        let unique = Deduplicator::new().dedup(events);
        let keys: HashSet<EventKey> = unique.iter().map(|e| e.identity_key()).collect();
        assert_eq!(keys.len(), unique.len());
        // same title at a different venue is a different screening
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_filter_keeps_event_within_lookback_buffer() {
        let filter = FutureEventFilter::with_reference(reference_now());
        // 6:15 PM is 15 minutes before now but inside the 30 minute buffer
        let kept = filter.retain_upcoming(vec![event("A", "V", "2025-01-22", "6:15 PM")]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_drops_event_past_lookback_buffer() {
        let filter = FutureEventFilter::with_reference(reference_now());
        let kept = filter.retain_upcoming(vec![event("A", "V", "2025-01-22", "5:00 PM")]);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_filter_exact_buffer_boundary_drops() {
        let filter = FutureEventFilter::with_reference(reference_now());
        // started exactly 30 minutes ago: not strictly inside the buffer
        let kept = filter.retain_upcoming(vec![event("A", "V", "2025-01-22", "5:30 PM")]);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_filter_yesterday_always_dropped_tomorrow_always_kept() {
        let filter = FutureEventFilter::with_reference(reference_now());
        let kept = filter.retain_upcoming(vec![
            event("Y", "V", "2025-01-21", "11:59 PM"),
            event("T", "V", "2025-01-23", "not a time"),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "T");
    }

    #[test]
    fn test_filter_fails_open_on_bad_date() {
        let filter = FutureEventFilter::with_reference(reference_now());
        let kept = filter.retain_upcoming(vec![event("A", "V", "sometime soon", "7:15 PM")]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_fails_open_on_bad_time_today() {
        let filter = FutureEventFilter::with_reference(reference_now());
        let kept = filter.retain_upcoming(vec![event("A", "V", "2025-01-22", "around eight")]);
        assert_eq!(kept.len(), 1);
    }
}
