//! Session driver
//!
//! Holds the transient state of one editing session (project, validation
//! report, course plan) and reports every step to the run store in the order
//! the pipeline expects. Upload parse failures are recorded on the run as a
//! failed `upload-received` event before being returned.

use crate::error::SessionError;
use crate::model::{Audit, PipelineStage, RunRecord, StageError};
use crate::store::{AdvanceParams, RunStore};
use chrono::{DateTime, Utc};
use passprep_core::{
    build_course_state, normalize_project, parse_upload, render_course_plan_markdown,
    render_workbook_markdown, validate_project, CourseState, Project, Settings, ValidationReport,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Artifact keys written by the session
pub mod artifact_keys {
    pub const SOURCE_UPLOAD: &str = "sourceUpload";
    pub const NORMALIZED_PROJECT: &str = "normalizedProject";
    pub const VALIDATION_REPORT: &str = "validationReport";
    pub const COURSE_PLAN_MARKDOWN: &str = "coursePlanMarkdown";
    pub const WORKBOOK_MARKDOWN: &str = "workbookMarkdown";
    pub const EXPORTS: &str = "exports";
}

use artifact_keys as keys;

/// Downloadable documents a session can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    CoursePlanJson,
    CoursePlanMarkdown,
    WorkbookMarkdown,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [
        ExportKind::CoursePlanJson,
        ExportKind::CoursePlanMarkdown,
        ExportKind::WorkbookMarkdown,
    ];

    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            ExportKind::CoursePlanJson => "course-plan.json",
            ExportKind::CoursePlanMarkdown => "course-plan.md",
            ExportKind::WorkbookMarkdown => "workbook-draft.md",
        }
    }

    #[must_use]
    pub fn format(self) -> ExportFormat {
        match self {
            ExportKind::CoursePlanJson => ExportFormat::Json,
            ExportKind::CoursePlanMarkdown | ExportKind::WorkbookMarkdown => ExportFormat::Markdown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
}

/// Entry in the `exports` artifact list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub filename: String,
    #[serde(rename = "type")]
    pub format: ExportFormat,
    pub created_at: DateTime<Utc>,
}

/// A rendered export ready to be written or served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub kind: ExportKind,
    pub filename: &'static str,
    pub content: String,
}

/// One editing session bound to one run
#[derive(Debug)]
pub struct Session<'a> {
    store: &'a RunStore,
    run_id: String,
    settings: Settings,
    project: Option<Project>,
    report: Option<ValidationReport>,
    course_state: Option<CourseState>,
}

impl<'a> Session<'a> {
    /// Create a run and bind a new session to it
    pub fn start(store: &'a RunStore, settings: Settings) -> Result<Self, SessionError> {
        let run = store.create_run(Some(settings.clone()))?;
        Ok(Self {
            store,
            run_id: run.id,
            settings,
            project: None,
            report: None,
            course_state: None,
        })
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn course_state(&self) -> Option<&CourseState> {
        self.course_state.as_ref()
    }

    /// Mutable access for review edits; edits invalidate approval
    pub fn course_state_mut(&mut self) -> Option<&mut CourseState> {
        self.course_state.as_mut()
    }

    /// Current persisted record of this session's run
    pub fn record(&self) -> Result<RunRecord, SessionError> {
        self.store
            .get_run(&self.run_id)?
            .ok_or_else(|| crate::error::StoreError::RunNotFound(self.run_id.clone()).into())
    }

    /// Parse, normalize and validate an upload.
    ///
    /// Any previous project and plan are discarded first, so a failed upload
    /// leaves the session with nothing to plan.
    pub fn upload(&mut self, text: &str) -> Result<&ValidationReport, SessionError> {
        self.project = None;
        self.report = None;
        self.course_state = None;

        let started = Instant::now();
        let raw = match parse_upload(text) {
            Ok(raw) => raw,
            Err(err) => {
                self.store.advance_run_stage(
                    self.params(PipelineStage::UploadReceived, started)
                        .with_message("Upload parse failed")
                        .with_error(
                            StageError::new(err.to_string())
                                .with_details("Could not parse JSON upload")
                                .retriable(true),
                        ),
                )?;
                return Err(err.into());
            }
        };
        self.store.advance_run_stage(
            self.params(PipelineStage::UploadReceived, started)
                .with_message("Upload received")
                .with_artifact(keys::SOURCE_UPLOAD, raw.clone()),
        )?;

        let started = Instant::now();
        let project = normalize_project(&raw, self.store.clock());
        self.store.advance_run_stage(
            self.params(PipelineStage::Normalized, started)
                .with_artifact(keys::NORMALIZED_PROJECT, serde_json::to_value(&project)?),
        )?;

        let started = Instant::now();
        let report = validate_project(&project);
        self.store.advance_run_stage(
            self.params(PipelineStage::Validated, started)
                .with_artifact(keys::VALIDATION_REPORT, serde_json::to_value(&report)?),
        )?;

        self.project = Some(project);
        Ok(self.report.insert(report))
    }

    /// Build a fresh, unapproved plan from the uploaded project
    pub fn generate_plan(&mut self, settings: Settings) -> Result<&CourseState, SessionError> {
        let (Some(project), Some(report)) = (&self.project, &self.report) else {
            return Err(SessionError::Precondition(
                "upload a project before generating a plan",
            ));
        };
        if !report.valid {
            return Err(SessionError::InvalidProject);
        }

        let started = Instant::now();
        let state = build_course_state(project, &settings, self.store.clock());
        self.store.advance_run_stage(
            self.params(PipelineStage::PlanGenerated, started)
                .with_settings(settings.clone())
                .with_course_state(state.clone())
                .with_artifact(
                    keys::COURSE_PLAN_MARKDOWN,
                    Value::String(render_course_plan_markdown(&state)),
                ),
        )?;

        self.settings = settings;
        Ok(self.course_state.insert(state))
    }

    /// Approve the plan as currently edited
    ///
    /// The session keeps its previous plan if the store rejects the advance.
    pub fn approve(&mut self) -> Result<(), SessionError> {
        let started = Instant::now();
        let mut state = self
            .course_state
            .clone()
            .ok_or(SessionError::Precondition("generate a plan before approving"))?;
        state.approve();
        self.store.advance_run_stage(
            self.params(PipelineStage::Approved, started)
                .with_course_state(state.clone())
                .with_artifact(
                    keys::COURSE_PLAN_MARKDOWN,
                    Value::String(render_course_plan_markdown(&state)),
                ),
        )?;
        self.course_state = Some(state);
        Ok(())
    }

    /// Derive the workbook from the approved plan
    pub fn generate_workbook(&mut self) -> Result<(), SessionError> {
        let started = Instant::now();
        let mut state = self.course_state.clone().ok_or(SessionError::Precondition(
            "generate a plan before generating a workbook",
        ))?;
        state.attach_workbook(self.store.clock())?;
        self.store.advance_run_stage(
            self.params(PipelineStage::WorkbookGenerated, started)
                .with_course_state(state.clone())
                .with_artifact(
                    keys::WORKBOOK_MARKDOWN,
                    Value::String(render_workbook_markdown(&state)),
                ),
        )?;
        self.course_state = Some(state);
        Ok(())
    }

    /// Render an export and record it on the run
    pub fn export(&self, kind: ExportKind) -> Result<ExportFile, SessionError> {
        let started = Instant::now();
        let state = self
            .course_state
            .as_ref()
            .ok_or(SessionError::Precondition("generate a plan before exporting"))?;
        if !state.is_approved() {
            return Err(SessionError::Precondition(
                "course plan must be approved before exporting",
            ));
        }

        let content = match kind {
            ExportKind::CoursePlanJson => serde_json::to_string_pretty(state)?,
            ExportKind::CoursePlanMarkdown => render_course_plan_markdown(state),
            ExportKind::WorkbookMarkdown => {
                if state.workbook.is_none() {
                    return Err(SessionError::Precondition(
                        "generate a workbook before exporting it",
                    ));
                }
                render_workbook_markdown(state)
            }
        };

        let mut exports = self.recorded_exports()?;
        exports.push(ExportRecord {
            filename: kind.filename().to_string(),
            format: kind.format(),
            created_at: self.store.clock().now(),
        });
        self.store.advance_run_stage(
            self.params(PipelineStage::Exported, started)
                .with_artifact(keys::EXPORTS, serde_json::to_value(&exports)?),
        )?;

        Ok(ExportFile {
            kind,
            filename: kind.filename(),
            content,
        })
    }

    fn recorded_exports(&self) -> Result<Vec<ExportRecord>, SessionError> {
        match self.record()?.artifacts.remove(keys::EXPORTS) {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn params(&self, stage: PipelineStage, started: Instant) -> AdvanceParams {
        AdvanceParams::new(&self.run_id, stage).with_audit(elapsed(started))
    }
}

fn elapsed(started: Instant) -> Audit {
    let ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Audit::with_duration_ms(ms)
        .with_field(Audit::TOKEN_INPUT, 0)
        .with_field(Audit::TOKEN_OUTPUT, 0)
        .with_field(Audit::ESTIMATED_COST_USD, 0.0)
}
