//! Run model: the persisted record of one pipeline attempt
//!
//! Field names on the wire are camelCase and stage names are kebab-case so a
//! store file written by this crate is readable by any client of the HTTP API.

use chrono::{DateTime, Utc};
use passprep_core::{CourseState, Settings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Fixed, linear pipeline stages in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    UploadReceived,
    Normalized,
    Validated,
    PlanGenerated,
    Approved,
    WorkbookGenerated,
    Exported,
}

impl PipelineStage {
    /// Every stage, in pipeline order
    pub const ALL: [PipelineStage; 7] = [
        PipelineStage::UploadReceived,
        PipelineStage::Normalized,
        PipelineStage::Validated,
        PipelineStage::PlanGenerated,
        PipelineStage::Approved,
        PipelineStage::WorkbookGenerated,
        PipelineStage::Exported,
    ];

    /// Zero-based position in the pipeline
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire name of the stage
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::UploadReceived => "upload-received",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Validated => "validated",
            PipelineStage::PlanGenerated => "plan-generated",
            PipelineStage::Approved => "approved",
            PipelineStage::WorkbookGenerated => "workbook-generated",
            PipelineStage::Exported => "exported",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage name that does not belong to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for PipelineStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

/// Outcome recorded for a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Structured error attached to a failed advance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retriable: Option<bool>,
}

impl StageError {
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn retriable(mut self, retriable: bool) -> Self {
        self.retriable = Some(retriable);
        self
    }
}

/// Most recent failure on a run; cleared by the next non-failed advance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub stage: PipelineStage,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retriable: Option<bool>,
    pub at: DateTime<Utc>,
}

/// Audit payload carried on an event
///
/// Stored and returned exactly as the caller sent it; the store never reads
/// or coerces the figures inside.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Audit(Map<String, Value>);

impl Audit {
    pub const DURATION_MS: &'static str = "durationMs";
    pub const TOKEN_INPUT: &'static str = "tokenInput";
    pub const TOKEN_OUTPUT: &'static str = "tokenOutput";
    pub const ESTIMATED_COST_USD: &'static str = "estimatedCostUsd";

    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit carrying only an elapsed duration
    #[inline]
    #[must_use]
    pub fn with_duration_ms(duration_ms: u64) -> Self {
        Self::new().with_field(Self::DURATION_MS, duration_ms)
    }

    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Recorded duration, integral or fractional
    pub fn duration_ms(&self) -> Option<f64> {
        self.get(Self::DURATION_MS).and_then(Value::as_f64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Audit {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// One entry in a run's append-only history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub id: String,
    pub run_id: String,
    pub stage: PipelineStage,
    pub status: StageStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageError>,
    #[serde(default)]
    pub audit: Audit,
}

/// Persisted record of one session attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stage of the last advance; `None` before any
    pub current_stage: Option<PipelineStage>,
    /// Status of every stage; always total
    pub stage_status: BTreeMap<PipelineStage, StageStatus>,
    /// Time of the last transition into each visited stage
    #[serde(default)]
    pub stage_timestamps: BTreeMap<PipelineStage, DateTime<Utc>>,
    pub settings: Option<Settings>,
    pub course_state: Option<CourseState>,
    /// Named payloads, shallow-merged on every advance
    #[serde(default)]
    pub artifacts: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
    #[serde(default)]
    pub events: Vec<RunEvent>,
}

impl RunRecord {
    /// Status recorded for `stage`
    #[must_use]
    pub fn status_of(&self, stage: PipelineStage) -> StageStatus {
        self.stage_status.get(&stage).copied().unwrap_or_default()
    }

    /// Artifact stored under `key`
    #[must_use]
    pub fn artifact(&self, key: &str) -> Option<&Value> {
        self.artifacts.get(key)
    }
}

/// Build a fresh run with every stage pending and no history
#[must_use]
pub fn create_empty_run(id: impl Into<String>, settings: Option<Settings>, now: DateTime<Utc>) -> RunRecord {
    RunRecord {
        id: id.into(),
        created_at: now,
        updated_at: now,
        current_stage: None,
        stage_status: PipelineStage::ALL
            .into_iter()
            .map(|stage| (stage, StageStatus::Pending))
            .collect(),
        stage_timestamps: BTreeMap::new(),
        settings,
        course_state: None,
        artifacts: Map::new(),
        last_error: None,
        events: Vec::new(),
    }
}

/// The whole store document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunDb {
    #[serde(default)]
    pub runs: HashMap<String, RunRecord>,
    /// Bumped on every successful write
    #[serde(default)]
    pub version: u64,
}
