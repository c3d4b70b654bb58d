/// Domain models for the application
use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Destination code meaning "no destination filter"
pub const ANY_DESTINATION: &str = "*";

/// API key value that disables network calls entirely
pub const SENTINEL_KEY: &str = "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

/// Length of a Rail Data Marketplace consumer key
pub const KEY_LEN: usize = 48;

/// Platform shown when the board does not report one
pub const UNKNOWN_PLATFORM: &str = "?";

const MAX_RULE_ID: i64 = 999;

/// A "quick time": show departures from `org` to `dest` between `start` and
/// `end` on the listed weekdays (0 = Sunday .. 6 = Saturday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickTime {
    pub id: i64,
    pub start: String,
    pub end: String,
    pub org: String,
    pub dest: String,
    pub days: Vec<u8>,
}

/// Persisted rule set (`qtt.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickTimes {
    pub quick_times: Vec<QuickTime>,
    /// Ids of deleted entries. Kept for file compatibility only.
    #[serde(default)]
    pub del_ids: Vec<i64>,
}

impl QuickTimes {
    /// Linear search, the list is kept in user order
    pub fn find_by_id(&self, id: i64) -> Option<&QuickTime> {
        self.quick_times.iter().find(|qt| qt.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn insert(&mut self, qt: QuickTime) {
        self.quick_times.push(qt);
    }

    /// Returns false when no entry carries `id`
    pub fn replace_by_id(&mut self, id: i64, qt: QuickTime) -> bool {
        match self.quick_times.iter_mut().find(|v| v.id == id) {
            Some(slot) => {
                *slot = qt;
                true
            }
            None => false,
        }
    }

    /// Removes the entry and records its id in `del_ids`
    pub fn remove_by_id(&mut self, id: i64) -> Option<QuickTime> {
        let pos = self.quick_times.iter().position(|v| v.id == id)?;
        let removed = self.quick_times.remove(pos);
        self.del_ids.push(id);
        Some(removed)
    }

    /// Draw ids from 1..=999 until one is unused.
    pub fn fresh_id(&self) -> Option<i64> {
        if self.quick_times.len() as i64 >= MAX_RULE_ID {
            return None;
        }
        let mut rng = rand::rng();
        loop {
            let id = rng.random_range(1..=MAX_RULE_ID);
            if !self.contains(id) {
                return Some(id);
            }
        }
    }
}

/// User settings (`settings.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Poll interval in seconds
    pub freq: f64,
    pub key: String,
    pub desired_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            freq: 60.0,
            key: SENTINEL_KEY.to_string(),
            desired_len: 5,
        }
    }
}

impl Settings {
    pub fn is_offline(&self) -> bool {
        self.key == SENTINEL_KEY
    }

    /// Settings with the API key hidden, for display
    pub fn masked(&self) -> Self {
        let visible: String = self.key.chars().take(4).collect();
        Self {
            key: format!("{}{}", visible, "*".repeat(self.key.len().saturating_sub(4))),
            ..self.clone()
        }
    }
}

/// One row of a departure board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainService {
    pub std: String,
    pub etd: String,
    pub platform: String,
    pub dest_crs: String,
    pub dest_name: String,
    pub operator: String,
    pub operator_code: String,
}

/// Departures for a single active quick time
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub rule: QuickTime,
    pub services: Vec<TrainService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one refresh pass
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub generated_at: DateTime<Utc>,
    pub local_time: NaiveDateTime,
    pub panels: Vec<Panel>,
}

impl Board {
    pub fn empty(generated_at: DateTime<Utc>, local_time: NaiveDateTime) -> Self {
        Self {
            generated_at,
            local_time,
            panels: Vec::new(),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub now: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qt(id: i64) -> QuickTime {
        QuickTime {
            id,
            start: "07:00".to_string(),
            end: "09:00".to_string(),
            org: "RDG".to_string(),
            dest: "PAD".to_string(),
            days: vec![1, 2, 3, 4, 5],
        }
    }

    #[test]
    fn test_remove_records_tombstone() {
        let mut qts = QuickTimes::default();
        qts.insert(qt(4));
        qts.insert(qt(9));

        let removed = qts.remove_by_id(4);
        assert_eq!(removed.map(|q| q.id), Some(4));
        assert_eq!(qts.quick_times.len(), 1);
        assert_eq!(qts.del_ids, vec![4]);
        assert!(qts.remove_by_id(4).is_none());
        assert_eq!(qts.del_ids, vec![4]);
    }

    #[test]
    fn test_replace_by_id() {
        let mut qts = QuickTimes::default();
        qts.insert(qt(1));
        let mut edited = qt(1);
        edited.dest = ANY_DESTINATION.to_string();

        assert!(qts.replace_by_id(1, edited));
        assert!(qts.find_by_id(1).is_some_and(|q| q.dest == ANY_DESTINATION));
        assert!(!qts.replace_by_id(2, qt(2)));
    }

    #[test]
    fn test_fresh_id_avoids_existing() {
        let mut qts = QuickTimes::default();
        for id in 1..=998 {
            qts.insert(qt(id));
        }
        assert_eq!(qts.fresh_id(), Some(999));

        qts.insert(qt(999));
        assert_eq!(qts.fresh_id(), None);
    }

    #[test]
    fn test_qtt_without_tombstones_parses() {
        let raw = r#"{"quick_times":[{"id":7,"start":"07:00","end":"09:30","org":"RDG","dest":"*","days":[1,5]}]}"#;
        let qts: QuickTimes = serde_json::from_str(raw).unwrap();
        assert_eq!(qts.quick_times[0].id, 7);
        assert!(qts.del_ids.is_empty());
    }

    #[test]
    fn test_masked_settings() {
        let settings = Settings {
            key: "ABCDEFGH".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.masked().key, "ABCD****");
        assert!(Settings::default().is_offline());
    }
}
