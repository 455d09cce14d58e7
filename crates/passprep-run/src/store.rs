//! File-backed run store
//!
//! The whole run table lives in one JSON document. Every mutation:
//! - takes the in-process lock
//! - reads the document and remembers its `version`
//! - applies the change to the in-memory copy
//! - re-checks the on-disk version, failing with [`StoreError::Conflict`] if
//!   another writer got there first
//! - writes the bumped document through a temp file and atomic rename
//!
//! A missing or empty file is an empty store. A corrupt file is an error.

use crate::error::StoreError;
use crate::model::{
    create_empty_run, Audit, LastError, PipelineStage, RunDb, RunEvent, RunRecord, StageError,
    StageStatus,
};
use crate::state_machine::validate_transition;
use passprep_core::{Clock, CourseState, Settings, SystemClock};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// File name of the store document inside a data directory
pub const STORE_FILE_NAME: &str = "runs.json";

/// Inputs to [`RunStore::advance_run_stage`]
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceParams {
    pub run_id: String,
    pub stage: PipelineStage,
    pub status: Option<StageStatus>,
    pub message: Option<String>,
    pub error: Option<StageError>,
    pub audit: Option<Audit>,
    pub settings: Option<Settings>,
    pub course_state: Option<CourseState>,
    pub artifacts: Option<Map<String, Value>>,
}

impl AdvanceParams {
    /// Advance `run_id` to `stage` with nothing else attached
    #[must_use]
    pub fn new(run_id: impl Into<String>, stage: PipelineStage) -> Self {
        Self {
            run_id: run_id.into(),
            stage,
            status: None,
            message: None,
            error: None,
            audit: None,
            settings: None,
            course_state: None,
            artifacts: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: StageStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: StageError) -> Self {
        self.error = Some(error);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_audit(mut self, audit: Audit) -> Self {
        self.audit = Some(audit);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_course_state(mut self, course_state: CourseState) -> Self {
        self.course_state = Some(course_state);
        self
    }

    /// Add one artifact; repeated keys keep the last value
    #[must_use]
    pub fn with_artifact(mut self, key: impl Into<String>, value: Value) -> Self {
        self.artifacts
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Map<String, Value>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Status the advance records: a supplied error always means failed
    #[must_use]
    pub fn resolved_status(&self) -> StageStatus {
        if self.error.is_some() {
            StageStatus::Failed
        } else {
            self.status.unwrap_or(StageStatus::Completed)
        }
    }
}

/// Run store over a single JSON file
pub struct RunStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl std::fmt::Debug for RunStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStore").field("path", &self.path).finish()
    }
}

impl RunStore {
    /// Open a store at `path` using the system clock
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    /// Open `<data_dir>/runs.json`
    #[must_use]
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::open(data_dir.as_ref().join(STORE_FILE_NAME))
    }

    /// Open a store at `path` with an explicit clock
    #[must_use]
    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            lock: Mutex::new(()),
        }
    }

    /// Location of the store document
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clock used to stamp runs and events
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Create and persist a run with every stage pending
    pub fn create_run(&self, settings: Option<Settings>) -> Result<RunRecord, StoreError> {
        let now = self.clock.now();
        let run = create_empty_run(Uuid::new_v4().to_string(), settings, now);
        self.mutate(|db| {
            db.runs.insert(run.id.clone(), run.clone());
            Ok(())
        })?;
        info!(run_id = %run.id, "Created run");
        Ok(run)
    }

    /// Look up a run; `None` if absent
    pub fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_db()?.runs.remove(run_id))
    }

    /// Ids of all stored runs, sorted
    pub fn run_ids(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock();
        let mut ids: Vec<String> = self.read_db()?.runs.into_keys().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Move a run to `params.stage`, merge payloads, append one event and persist
    pub fn advance_run_stage(&self, params: AdvanceParams) -> Result<RunRecord, StoreError> {
        let now = self.clock.now();
        let status = params.resolved_status();
        let AdvanceParams {
            run_id,
            stage,
            message,
            error,
            audit,
            settings,
            course_state,
            artifacts,
            ..
        } = params;

        let run = self.mutate(|db| {
            let run = db
                .runs
                .get_mut(&run_id)
                .ok_or_else(|| StoreError::RunNotFound(run_id.clone()))?;
            validate_transition(run.current_stage, stage)?;

            run.current_stage = Some(stage);
            run.updated_at = now;
            run.stage_status.insert(stage, status);
            run.stage_timestamps.insert(stage, now);
            if let Some(settings) = settings {
                run.settings = Some(settings);
            }
            if let Some(course_state) = course_state {
                run.course_state = Some(course_state);
            }
            if let Some(artifacts) = artifacts {
                run.artifacts.extend(artifacts);
            }
            run.last_error = error.as_ref().map(|error| LastError {
                stage,
                message: error.message.clone(),
                details: error.details.clone(),
                retriable: error.retriable,
                at: now,
            });
            run.events.push(RunEvent {
                id: Uuid::new_v4().to_string(),
                run_id: run.id.clone(),
                stage,
                status,
                created_at: now,
                message,
                error,
                audit: audit.unwrap_or_default(),
            });
            Ok(run.clone())
        })?;

        if status == StageStatus::Failed {
            warn!(run_id = %run.id, %stage, "Recorded failed stage");
        } else {
            info!(run_id = %run.id, %stage, ?status, "Advanced run");
        }
        Ok(run)
    }

    /// Read-modify-write the whole document under the lock
    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut RunDb) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock();
        let mut db = self.read_db()?;
        let expected = db.version;
        let out = apply(&mut db)?;

        let found = self.read_db()?.version;
        if found != expected {
            warn!(path = %self.path.display(), expected, found, "Store conflict");
            return Err(StoreError::Conflict { expected, found });
        }
        db.version = expected + 1;
        self.write_db(&db)?;
        Ok(out)
    }

    fn read_db(&self) -> Result<RunDb, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RunDb::default()),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(RunDb::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_db(&self, db: &RunDb) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, db)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), version = db.version, "Wrote store");
        Ok(())
    }
}
