// Todo record and id assignment

use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};

/// Identifier of a todo, derived from its creation time in milliseconds
pub type TodoId = i64;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Create an open todo stamped with `created_at`
    pub fn new(id: TodoId, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at,
        }
    }
}

/// Hands out strictly increasing ids based on wall-clock milliseconds.
///
/// Two todos created within the same millisecond would share a raw timestamp,
/// so the next id is bumped to one past the last id handed out or observed.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: Option<TodoId>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for a todo created at `now`.
    ///
    /// Fails once the last id is `i64::MAX`, since no larger id exists.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<TodoId> {
        let candidate = now.timestamp_millis();
        let id = match self.last {
            Some(last) if candidate <= last => last
                .checked_add(1)
                .ok_or_else(|| eyre!("Todo id space exhausted (last id {})", last))?,
            _ => candidate,
        };
        self.last = Some(id);
        Ok(id)
    }

    /// Record an id that already exists so it is never handed out again
    pub fn observe(&mut self, id: TodoId) {
        self.last = Some(self.last.map_or(id, |last| last.max(id)));
    }
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// createdAt is written as RFC 3339; epoch milliseconds are accepted on read
mod created_at {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| de::Error::custom(format!("invalid createdAt {:?}: {}", s, e))),
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| de::Error::custom(format!("createdAt out of range: {}", ms))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_new_todo_is_open() {
        let todo = Todo::new(1, "buy milk", at(1_000));
        assert_eq!(todo.text, "buy milk");
        assert!(!todo.completed);
        assert_eq!(todo.created_at, at(1_000));
    }

    #[test]
    fn test_todo_serialization_shape() {
        let todo = Todo::new(1_700_000_000_000, "write tests", at(1_700_000_000_000));
        let json = serde_json::to_value(&todo).unwrap();

        assert_eq!(json["id"], 1_700_000_000_000i64);
        assert_eq!(json["text"], "write tests");
        assert_eq!(json["completed"], false);
        assert!(json["createdAt"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn test_created_at_preserves_sub_millisecond_precision() {
        let created_at = at(1_700_000_000_123) + Duration::nanoseconds(456_789);
        let todo = Todo::new(1, "precise", created_at);

        let json = serde_json::to_string(&todo).unwrap();
        let back: Todo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.created_at, created_at);
    }

    #[test]
    fn test_created_at_accepts_js_iso_string() {
        let json = r#"{"id":1,"text":"a","completed":true,"createdAt":"2024-03-01T12:00:00.000Z"}"#;
        let todo: Todo = serde_json::from_str(json).unwrap();
        assert_eq!(todo.created_at, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert!(todo.completed);
    }

    #[test]
    fn test_created_at_accepts_epoch_millis() {
        let json = r#"{"id":1,"text":"a","completed":false,"createdAt":1000}"#;
        let todo: Todo = serde_json::from_str(json).unwrap();
        assert_eq!(todo.created_at, at(1_000));
    }

    #[test]
    fn test_created_at_rejects_garbage() {
        let json = r#"{"id":1,"text":"a","completed":false,"createdAt":"yesterday"}"#;
        assert!(serde_json::from_str::<Todo>(json).is_err());
    }

    #[test]
    fn test_id_generator_uses_timestamp() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next(at(5_000)).unwrap(), 5_000);
        assert_eq!(ids.next(at(6_000)).unwrap(), 6_000);
    }

    #[test]
    fn test_id_generator_same_millisecond() {
        let mut ids = IdGenerator::new();
        let now = at(5_000);
        assert_eq!(ids.next(now).unwrap(), 5_000);
        assert_eq!(ids.next(now).unwrap(), 5_001);
        assert_eq!(ids.next(now).unwrap(), 5_002);
    }

    #[test]
    fn test_id_generator_clock_going_backwards() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next(at(5_000)).unwrap(), 5_000);
        assert_eq!(ids.next(at(4_000)).unwrap(), 5_001);
    }

    #[test]
    fn test_id_generator_observe() {
        let mut ids = IdGenerator::new();
        ids.observe(9_000);
        ids.observe(3_000);
        assert_eq!(ids.next(at(5_000)).unwrap(), 9_001);
        assert_eq!(ids.next(at(10_000)).unwrap(), 10_000);
    }

    #[test]
    fn test_id_generator_exhausted() {
        let mut ids = IdGenerator::new();
        ids.observe(i64::MAX);

        let err = ids.next(at(5_000)).unwrap_err();
        assert!(err.to_string().contains("exhausted"));

        // A failed call does not move the generator
        assert!(ids.next(at(5_000)).is_err());
    }
}
