use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Parameters recovered from a propagation path, keyed by canonical name.
pub type Params = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Display,
    Custom(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::Display => "display",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        match value {
            "click" => Self::Click,
            "display" => Self::Display,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub params: Params,
}

impl EventRecord {
    pub fn new(kind: impl Into<EventKind>, params: Params) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    pub fn click(params: Params) -> Self {
        Self::new(EventKind::Click, params)
    }

    pub fn display(params: Params) -> Self {
        Self::new(EventKind::Display, params)
    }
}
