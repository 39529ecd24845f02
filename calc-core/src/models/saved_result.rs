use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{DerivedOutputs, InputState};

/// A calculation the user chose to keep. Persisted as an opaque JSON blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResult {
    pub slug: String,
    pub title: String,
    pub inputs: InputState,
    pub outputs: DerivedOutputs,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SavedResult {
    /// Captures a result stamped with the current time.
    pub fn capture(
        slug: &str,
        title: &str,
        inputs: InputState,
        outputs: DerivedOutputs,
    ) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            inputs,
            outputs,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
