use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use super::types::ClassificationResult;

pub const PREVIEW_CHARS: usize = 100;
const PREVIEW_ELLIPSIS: &str = "...";

/// One persisted classification, as stored in the history document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub email_content: String,
    pub content_preview: String,
    pub result: ClassificationResult,
    pub session_info: SessionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub classification_time: String,
}

/// Accepts RFC 3339 as well as ISO-8601 without an offset
/// (`2024-05-01T10:00:00.123456`), which is read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(stamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(stamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| de::Error::custom(format!("invalid timestamp {raw:?}: {err}")))
}

/// First [`PREVIEW_CHARS`] characters of `content`, with `...` appended when cut.
pub fn content_preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => {
            let mut preview = String::with_capacity(cut + PREVIEW_ELLIPSIS.len());
            preview.push_str(&content[..cut]);
            preview.push_str(PREVIEW_ELLIPSIS);
            preview
        }
        None => content.to_string(),
    }
}
