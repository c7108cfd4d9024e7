use crate::error::Result;
use crate::types::Event;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Persistence boundary for the final event list.
#[async_trait]
pub trait EventStorage: Send + Sync {
    async fn save_events(&self, events: &[Event]) -> Result<()>;
    async fn load_events(&self) -> Result<Vec<Event>>;
}

/// Writes the aggregated list as pretty-printed JSON, the format consumed
/// by the calendar frontend.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventStorage for JsonFileStorage {
    async fn save_events(&self, events: &[Event]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(events)?;
        fs::write(&self.path, json)?;
        info!("Saved {} events to {}", events.len(), self.path.display());
        Ok(())
    }

    async fn load_events(&self) -> Result<Vec<Event>> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn event(title: &str, url: Option<&str>) -> Event {
        Event {
            title: title.to_string(),
            venue: "Vidiots".to_string(),
            venue_short: "Vidiots".to_string(),
            event_type: "film".to_string(),
            date: "2025-06-01".to_string(),
            time: "4:00 PM".to_string(),
            description: String::new(),
            url: url.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("events.json"));

        let events = vec![
            event("First Cow", Some("https://example.com/first-cow")),
            event("Old Joy", None),
        ];
        storage.save_events(&events).await.unwrap();

        let loaded = storage.load_events().await.unwrap();
        assert_eq!(loaded, events);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("out/nested/events.json"));
        storage.save_events(&[event("Heat", None)]).await.unwrap();
        assert_eq!(storage.load_events().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_field_names_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        let storage = JsonFileStorage::new(&path);
        storage
            .save_events(&[event("Heat", Some("https://example.com/heat"))])
            .await
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"venueShort\""));
        assert!(raw.contains("\"type\""));
        assert!(!raw.contains("venue_short"));
    }
}
