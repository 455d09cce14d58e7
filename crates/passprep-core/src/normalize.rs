//! Tolerant upload normalization
//!
//! Upstream exporters disagree on field names, so every canonical field
//! resolves from an ordered list of accepted source keys. The first key whose
//! value is present wins; a value counts as absent when it is missing, `null`,
//! an empty or whitespace-only string, or not representable as text.

use crate::clock::Clock;
use crate::error::TransformError;
use crate::types::{Project, SourceMetadata, Video};
use serde_json::{Map, Value};

/// Accepted keys for the project name, in precedence order
pub const PROJECT_NAME_KEYS: &[&str] = &["projectName", "name"];
/// Accepted keys for the video list, in precedence order
pub const VIDEO_LIST_KEYS: &[&str] = &["videos", "items"];
/// Accepted keys for a video id, in precedence order
pub const VIDEO_ID_KEYS: &[&str] = &["id", "videoId"];
/// Accepted keys for a video title, in precedence order
pub const VIDEO_TITLE_KEYS: &[&str] = &["title", "name"];
/// Accepted keys for a transcript, in precedence order
pub const VIDEO_TEXT_KEYS: &[&str] = &["rawText", "transcript"];
/// Accepted keys for a duration, in precedence order
pub const VIDEO_DURATION_KEYS: &[&str] = &["duration", "durationSeconds"];
/// Accepted keys for an upstream status, in precedence order
pub const VIDEO_STATUS_KEYS: &[&str] = &["status", "jobStatus"];

/// Fallback project name
pub const UNTITLED_PROJECT: &str = "Untitled Project";
/// Source file type recorded for uploads
pub const SOURCE_FILE_TYPE: &str = "project.json";

/// Parse raw upload text into JSON.
///
/// This is the only step of ingestion that can fail; everything after it
/// defaults missing structure instead of rejecting it.
pub fn parse_upload(text: &str) -> Result<Value, TransformError> {
    Ok(serde_json::from_str(text)?)
}

/// Map a loosely shaped upload onto the canonical [`Project`].
///
/// Never fails: a non-object payload normalizes to an untitled project with
/// no videos, and non-object video entries normalize as if they were `{}`.
pub fn normalize_project(raw: &Value, clock: &dyn Clock) -> Project {
    let empty = Map::new();
    let root = raw.as_object().unwrap_or(&empty);

    let project_name =
        resolve_text(root, PROJECT_NAME_KEYS).unwrap_or_else(|| UNTITLED_PROJECT.to_string());

    let videos = resolve_array(root, VIDEO_LIST_KEYS)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| normalize_video(item.as_object().unwrap_or(&empty), index))
                .collect()
        })
        .unwrap_or_default();

    tracing::debug!(project = %project_name, "Normalized upload");

    Project {
        project_name,
        source_metadata: SourceMetadata {
            source_file_type: SOURCE_FILE_TYPE.to_string(),
            imported_at: clock.now(),
        },
        videos,
    }
}

fn normalize_video(entry: &Map<String, Value>, index: usize) -> Video {
    let position = index + 1;
    Video {
        id: resolve_text(entry, VIDEO_ID_KEYS).unwrap_or_else(|| format!("video-{position}")),
        title: resolve_text(entry, VIDEO_TITLE_KEYS).unwrap_or_else(|| format!("Video {position}")),
        raw_text: resolve_text(entry, VIDEO_TEXT_KEYS)
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
        duration: resolve_text(entry, VIDEO_DURATION_KEYS),
        status: resolve_text(entry, VIDEO_STATUS_KEYS),
    }
}

/// Resolve the first present textual value among `keys`
#[must_use]
pub fn resolve_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(coerce_text)
        .next()
}

fn resolve_array<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(Value::as_array)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
