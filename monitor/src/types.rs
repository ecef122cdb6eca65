//! Event types emitted by the sentinel watchers.
//!
//! All types serialize to camelCase JSON so `test-notify --json` output and
//! log fields look the same as what the assistant writes into the sentinel.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key used when sentinel content is not a JSON object.
pub const RAW_PAYLOAD_KEY: &str = "raw";

/// Which condition a sentinel file signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelKind {
    /// The assistant finished its turn.
    Task,
    /// The context window is close to capacity.
    Context,
    /// The assistant is about to ask for permission to edit a file.
    Confirmation,
}

impl SentinelKind {
    /// Every kind, in the order watchers are started.
    pub const ALL: [SentinelKind; 3] = [Self::Task, Self::Context, Self::Confirmation];

    /// Fixed source tag attached to events from this kind's watcher.
    #[must_use]
    pub fn source_tag(self) -> &'static str {
        match self {
            Self::Task => "file-watcher",
            Self::Context => "context-watcher",
            Self::Confirmation => "file-confirmation-watcher",
        }
    }

    /// Default sentinel location, relative to the home directory.
    #[must_use]
    pub fn default_flag_file(self) -> &'static str {
        match self {
            Self::Task => "~/.cursor-notify.flag",
            Self::Context => "~/.cursor-context-alert.flag",
            Self::Confirmation => "~/.cursor-file-confirm.flag",
        }
    }

    /// Short human label used in log lines and notifications.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Task => "task complete",
            Self::Context => "context alert",
            Self::Confirmation => "file confirmation",
        }
    }
}

impl fmt::Display for SentinelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Task => "task",
            Self::Context => "context",
            Self::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

impl FromStr for SentinelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" => Ok(Self::Task),
            "context" => Ok(Self::Context),
            "confirmation" | "confirm" => Ok(Self::Confirmation),
            other => Err(format!(
                "unknown sentinel kind '{other}' (expected task, context or confirmation)"
            )),
        }
    }
}

/// One debounced burst of activity on a sentinel file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEvent {
    /// When the debounce window closed.
    pub timestamp: DateTime<Utc>,

    /// Tag of the watcher (or command) that produced the event.
    pub source: String,

    /// Which condition fired.
    pub kind: SentinelKind,

    /// The sentinel file that was observed.
    pub path: PathBuf,

    /// Best-effort parse of the sentinel content.
    pub payload: Map<String, Value>,
}

impl WatchEvent {
    /// Creates an event stamped with the current time and the kind's source tag.
    #[must_use]
    pub fn new(kind: SentinelKind, path: PathBuf, payload: Map<String, Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            source: kind.source_tag().to_string(),
            kind,
            path,
            payload,
        }
    }

    /// Overrides the source tag (used for manually triggered events).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Turns sentinel file content into an event payload.
///
/// A JSON object is used as-is. Anything else (another JSON value, or text
/// that does not parse) is carried as the trimmed raw text under
/// [`RAW_PAYLOAD_KEY`].
///
/// # Examples
///
/// ```
/// use cursor_helper::types::parse_payload;
///
/// let payload = parse_payload(r#"{"usage": 91}"#);
/// assert_eq!(payload["usage"], 91);
///
/// let payload = parse_payload("Mon Jan 1 :: CURSOR_DONE\n");
/// assert_eq!(payload["raw"], "Mon Jan 1 :: CURSOR_DONE");
/// ```
#[must_use]
pub fn parse_payload(content: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert(
                RAW_PAYLOAD_KEY.to_string(),
                Value::String(content.trim().to_string()),
            );
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_tags_are_distinct() {
        let tags: std::collections::HashSet<_> =
            SentinelKind::ALL.iter().map(|k| k.source_tag()).collect();
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn kind_round_trips_through_display() {
        for kind in SentinelKind::ALL {
            assert_eq!(kind.to_string().parse::<SentinelKind>(), Ok(kind));
        }
    }

    #[test]
    fn kind_parse_accepts_confirm_alias_and_case() {
        assert_eq!("CONFIRM".parse::<SentinelKind>(), Ok(SentinelKind::Confirmation));
        assert!("bogus".parse::<SentinelKind>().is_err());
    }

    #[test]
    fn payload_object_is_used_directly() {
        let payload = parse_payload(r#"{"usage": 91, "model": "x"}"#);
        assert_eq!(payload.get("usage"), Some(&json!(91)));
        assert_eq!(payload.get("model"), Some(&json!("x")));
        assert!(!payload.contains_key(RAW_PAYLOAD_KEY));
    }

    #[test]
    fn payload_plain_text_falls_back_to_raw() {
        let payload = parse_payload("  Tue :: CONTEXT_ALERT \n");
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[RAW_PAYLOAD_KEY], json!("Tue :: CONTEXT_ALERT"));
    }

    #[test]
    fn payload_non_object_json_falls_back_to_raw() {
        let payload = parse_payload("42");
        assert_eq!(payload[RAW_PAYLOAD_KEY], json!("42"));
    }

    #[test]
    fn payload_empty_content_is_empty_raw() {
        let payload = parse_payload("");
        assert_eq!(payload[RAW_PAYLOAD_KEY], json!(""));
    }

    #[test]
    fn event_serializes_camel_case() {
        let event = WatchEvent::new(
            SentinelKind::Context,
            PathBuf::from("/tmp/flag"),
            Map::new(),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["source"], "context-watcher");
        assert_eq!(value["kind"], "context");
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn with_source_overrides_tag() {
        let event = WatchEvent::new(SentinelKind::Task, PathBuf::from("/f"), Map::new())
            .with_source("test-command");
        assert_eq!(event.source, "test-command");
        assert_eq!(event.kind, SentinelKind::Task);
    }
}
