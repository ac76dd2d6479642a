//! Event type enum as the single source of truth for event log type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four occurrences recorded in a task's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Start,
    Pause,
    Resume,
    Stop,
}

impl EventType {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "stop" => Ok(Self::Stop),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event type strings.
#[derive(Debug, Clone)]
pub struct UnknownEventType(String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_stored_form() {
        for variant in [
            EventType::Start,
            EventType::Pause,
            EventType::Resume,
            EventType::Stop,
        ] {
            let parsed: EventType = variant.as_str().parse().expect("should parse");
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn unknown_type_errors() {
        let err = "clock_in".parse::<EventType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown event type: clock_in");
    }

    #[test]
    fn serializes_as_lowercase_string() {
        let json = serde_json::to_string(&EventType::Resume).unwrap();
        assert_eq!(json, "\"resume\"");
    }
}
