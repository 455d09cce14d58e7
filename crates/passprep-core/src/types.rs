//! Core types for PassPrep
//!
//! Defines the canonical shapes the pipeline works on:
//! - The normalized project and its videos
//! - Generation settings and their enumerated options

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Module count used when settings omit it or supply something non-numeric
pub const DEFAULT_MODULE_COUNT: usize = 4;

/// Where a normalized project came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    /// Kind of file the project was read from
    pub source_file_type: String,
    /// When the upload was normalized
    pub imported_at: DateTime<Utc>,
}

/// One source video after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Identifier; expected unique within a project but not enforced
    pub id: String,
    /// Source title
    pub title: String,
    /// Transcript text, trimmed; may be empty
    pub raw_text: String,
    /// Duration as supplied by the exporter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Upstream processing status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Video {
    /// Create a video with no duration or status
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            raw_text: raw_text.into(),
            duration: None,
            status: None,
        }
    }

    /// With upstream status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// With duration
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }
}

/// A project in canonical shape
///
/// Video order is upload order and drives module chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Display name of the project
    pub project_name: String,
    /// Provenance of the upload
    pub source_metadata: SourceMetadata,
    /// Videos in upload order
    pub videos: Vec<Video>,
}

/// Style used for generated video titles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TitleStyle {
    /// "Understanding ..." titles
    #[default]
    #[serde(rename = "Clear & Practical", alias = "Clear&Practical")]
    ClearPractical,
    /// "Analysis of ..." titles
    Academic,
    /// "Unlocking ..." titles
    Inspirational,
}

impl TitleStyle {
    /// Leading phrase placed before the title base
    #[inline]
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            TitleStyle::Academic => "Analysis of",
            TitleStyle::Inspirational => "Unlocking",
            TitleStyle::ClearPractical => "Understanding",
        }
    }
}

/// Length of generated video descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DescriptionLength {
    /// One clause
    Short,
    /// Two clauses
    #[default]
    Medium,
    /// Three clauses
    Long,
}

/// How much workbook material to generate per module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkbookDepth {
    /// Two questions and ideas per module
    Light,
    /// Three questions and ideas per module
    #[default]
    Standard,
    /// Five questions and ideas per module
    Heavy,
}

impl WorkbookDepth {
    /// Number of reflection questions (and key ideas) per module
    #[inline]
    #[must_use]
    pub fn question_count(self) -> usize {
        match self {
            WorkbookDepth::Light => 2,
            WorkbookDepth::Standard => 3,
            WorkbookDepth::Heavy => 5,
        }
    }
}

impl std::fmt::Display for WorkbookDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WorkbookDepth::Light => "Light",
            WorkbookDepth::Standard => "Standard",
            WorkbookDepth::Heavy => "Heavy",
        };
        f.write_str(label)
    }
}

/// Generation settings chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Requested number of modules; never below 1
    #[serde(
        default = "default_module_count",
        deserialize_with = "deserialize_module_count"
    )]
    pub module_count: usize,
    /// Title style
    #[serde(default)]
    pub title_style: TitleStyle,
    /// Description length
    #[serde(default)]
    pub description_length: DescriptionLength,
    /// Workbook depth
    #[serde(default)]
    pub workbook_depth: WorkbookDepth,
    /// Free text, reserved; not read by generation
    #[serde(default)]
    pub project_notes: String,
}

impl Settings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With module count, clamped to at least 1
    #[inline]
    #[must_use]
    pub fn with_module_count(mut self, count: usize) -> Self {
        self.module_count = count.max(1);
        self
    }

    /// With title style
    #[inline]
    #[must_use]
    pub fn with_title_style(mut self, style: TitleStyle) -> Self {
        self.title_style = style;
        self
    }

    /// With description length
    #[inline]
    #[must_use]
    pub fn with_description_length(mut self, length: DescriptionLength) -> Self {
        self.description_length = length;
        self
    }

    /// With workbook depth
    #[inline]
    #[must_use]
    pub fn with_workbook_depth(mut self, depth: WorkbookDepth) -> Self {
        self.workbook_depth = depth;
        self
    }

    /// Module count as used by generation, even if the field was set to 0 directly
    #[inline]
    #[must_use]
    pub fn effective_module_count(&self) -> usize {
        self.module_count.max(1)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            module_count: DEFAULT_MODULE_COUNT,
            title_style: TitleStyle::default(),
            description_length: DescriptionLength::default(),
            workbook_depth: WorkbookDepth::default(),
            project_notes: String::new(),
        }
    }
}

fn default_module_count() -> usize {
    DEFAULT_MODULE_COUNT
}

/// Coerce any JSON value into a module count of at least 1.
///
/// Numbers (integer or float) are truncated and clamped; numeric strings are
/// parsed the same way; anything else falls back to the default count.
fn deserialize_module_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_module_count(&value))
}

/// Lenient module-count coercion shared by settings parsing and the API layer
#[must_use]
pub fn coerce_module_count(value: &Value) -> usize {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(n) if n.is_finite() => {
            if n < 1.0 {
                1
            } else {
                n.trunc().min(usize::MAX as f64) as usize
            }
        }
        _ => DEFAULT_MODULE_COUNT,
    }
}
