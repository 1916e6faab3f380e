//! Read access to one server entry of the Nezha `server/details` response

use nezha_common::{ExporterError, Result};
use serde_json::Value;

/// Top-level keys a record needs before it is worth updating from
pub const REQUIRED_KEYS: [&str; 3] = ["name", "host", "status"];

/// Outcome of walking a dotted path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    NotFound,
}

/// Borrowed view of a single eligible server record
#[derive(Debug, Clone, Copy)]
pub struct ServerRecord<'a> {
    value: &'a Value,
}

impl<'a> ServerRecord<'a> {
    /// Wrap `value` if it carries every key in [`REQUIRED_KEYS`].
    ///
    /// Upstream routinely reports servers that have not checked in yet; those
    /// are returned as `None` rather than as an error.
    pub fn eligible(value: &'a Value) -> Option<Self> {
        let object = value.as_object()?;
        if REQUIRED_KEYS.iter().all(|key| object.contains_key(*key)) {
            Some(Self { value })
        } else {
            None
        }
    }

    /// Label value identifying the server
    pub fn name(&self) -> String {
        match &self.value["name"] {
            Value::String(name) => name.clone(),
            other => other.to_string(),
        }
    }

    /// Descend through each dot-separated segment of `path`
    pub fn resolve(&self, path: &str) -> Lookup<'a> {
        let mut current = self.value;
        for segment in path.split('.') {
            match current.as_object().and_then(|object| object.get(segment)) {
                Some(next) => current = next,
                None => return Lookup::NotFound,
            }
        }
        Lookup::Found(current)
    }

    /// Resolve `path` to a number
    pub fn numeric(&self, path: &str) -> Result<f64> {
        match self.resolve(path) {
            Lookup::Found(Value::Number(number)) => number
                .as_f64()
                .ok_or_else(|| ExporterError::TypeMismatch(path.to_string())),
            Lookup::Found(_) => Err(ExporterError::TypeMismatch(path.to_string())),
            Lookup::NotFound => Err(ExporterError::FieldNotFound(path.to_string())),
        }
    }

    /// Descriptive label taken from `path`; missing and null become empty
    pub fn label(&self, path: &str) -> String {
        match self.resolve(path) {
            Lookup::Found(Value::String(text)) => text.clone(),
            Lookup::Found(Value::Null) | Lookup::NotFound => String::new(),
            Lookup::Found(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Map};

    fn sample() -> Value {
        json!({
            "name": "tokyo-1",
            "last_active": 1700000000,
            "host": {"Platform": "debian", "Arch": null, "MemTotal": 2048},
            "status": {"CPU": 3.5, "Load1": "high", "Disk": {"Used": 12}}
        })
    }

    #[test]
    fn test_eligibility() {
        assert!(ServerRecord::eligible(&sample()).is_some());
        assert!(ServerRecord::eligible(&json!({"name": "a", "host": {}})).is_none());
        assert!(ServerRecord::eligible(&json!({"host": {}, "status": {}})).is_none());
        assert!(ServerRecord::eligible(&json!({"name": "a", "status": {}})).is_none());
        assert!(ServerRecord::eligible(&json!(["name", "host", "status"])).is_none());
        // Presence is what counts, not the value
        assert!(ServerRecord::eligible(&json!({"name": "a", "host": null, "status": null})).is_some());
    }

    #[test]
    fn test_resolve_nested() {
        let value = sample();
        let record = ServerRecord::eligible(&value).unwrap();

        assert_eq!(record.resolve("last_active"), Lookup::Found(&json!(1700000000)));
        assert_eq!(record.resolve("status.Disk.Used"), Lookup::Found(&json!(12)));
        assert_eq!(record.resolve("status.Missing"), Lookup::NotFound);
        assert_eq!(record.resolve("status.Disk.Used.Deeper"), Lookup::NotFound);
        assert_eq!(record.resolve("nope.CPU"), Lookup::NotFound);
    }

    #[test]
    fn test_numeric_validation() {
        let value = sample();
        let record = ServerRecord::eligible(&value).unwrap();

        assert_eq!(record.numeric("status.CPU").unwrap(), 3.5);
        assert_eq!(record.numeric("host.MemTotal").unwrap(), 2048.0);
        assert!(matches!(
            record.numeric("status.Load1"),
            Err(ExporterError::TypeMismatch(path)) if path == "status.Load1"
        ));
        assert!(matches!(
            record.numeric("host.Arch"),
            Err(ExporterError::TypeMismatch(_))
        ));
        assert!(matches!(
            record.numeric("status.Disk"),
            Err(ExporterError::TypeMismatch(_))
        ));
        assert!(matches!(
            record.numeric("status.Uptime"),
            Err(ExporterError::FieldNotFound(path)) if path == "status.Uptime"
        ));
    }

    #[test]
    fn test_booleans_are_not_numeric() {
        let value = json!({"name": "a", "host": {}, "status": {"Online": true}});
        let record = ServerRecord::eligible(&value).unwrap();
        assert!(matches!(
            record.numeric("status.Online"),
            Err(ExporterError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_labels() {
        let value = sample();
        let record = ServerRecord::eligible(&value).unwrap();

        assert_eq!(record.name(), "tokyo-1");
        assert_eq!(record.label("host.Platform"), "debian");
        assert_eq!(record.label("host.Arch"), "");
        assert_eq!(record.label("host.CountryCode"), "");
        assert_eq!(record.label("host.MemTotal"), "2048");
    }

    #[test]
    fn test_non_string_name() {
        let value = json!({"name": 42, "host": {}, "status": {}});
        let record = ServerRecord::eligible(&value).unwrap();
        assert_eq!(record.name(), "42");
    }

    proptest! {
        #[test]
        fn prop_nested_path_resolves(
            segments in prop::collection::vec("[a-zA-Z][a-zA-Z0-9_]{0,8}", 1..5),
            leaf in any::<i64>(),
        ) {
            let mut value = json!(leaf);
            for segment in segments.iter().rev() {
                let mut level = Map::new();
                level.insert(segment.clone(), value);
                value = Value::Object(level);
            }
            let mut object = value.as_object().cloned().unwrap();
            for key in REQUIRED_KEYS {
                object.entry(key).or_insert(json!({}));
            }
            let value = Value::Object(object);
            let record = ServerRecord::eligible(&value).unwrap();
            let path = segments.join(".");

            prop_assert_eq!(record.resolve(&path), Lookup::Found(&json!(leaf)));
            prop_assert_eq!(record.numeric(&path).unwrap(), leaf as f64);

            let missing = format!("{}.absent_segment", path);
            prop_assert_eq!(record.resolve(&missing), Lookup::NotFound);
        }
    }
}
