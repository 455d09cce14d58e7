//! End-to-end tests for the session driver against a real store file.
//!
//! A session must leave the same trail on the run that the interactive flow
//! does: one event per step, artifacts under their well-known keys, and a
//! failed `upload-received` event when the upload cannot be parsed.

use passprep_core::{Settings, TransformError, WorkbookDepth};
use passprep_run::session::artifact_keys;
use passprep_run::{
    ExportKind, ExportRecord, PipelineStage, Session, SessionError, StageStatus, StoreError,
};
use passprep_test_utils::{demo_settings, messy_upload, temp_store, DEMO_UPLOAD, MALFORMED_UPLOAD};
use pretty_assertions::assert_eq;

/// Full happy path: upload through export, checking the recorded trail.
#[test]
fn full_session_records_every_stage() {
    let (_dir, store) = temp_store();
    let mut session = Session::start(&store, demo_settings()).unwrap();

    let report = session.upload(DEMO_UPLOAD).unwrap();
    assert!(report.valid);
    assert_eq!(report.video_count, 3);

    let state = session.generate_plan(demo_settings()).unwrap();
    assert_eq!(state.modules.len(), 2);
    assert!(!state.is_approved());

    session.approve().unwrap();
    session.generate_workbook().unwrap();
    for kind in ExportKind::ALL {
        let file = session.export(kind).unwrap();
        assert_eq!(file.filename, kind.filename());
        assert!(!file.content.is_empty());
    }

    let run = session.record().unwrap();
    assert_eq!(run.current_stage, Some(PipelineStage::Exported));
    assert!(PipelineStage::ALL
        .into_iter()
        .all(|stage| run.status_of(stage) == StageStatus::Completed));
    let stages: Vec<_> = run.events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::UploadReceived,
            PipelineStage::Normalized,
            PipelineStage::Validated,
            PipelineStage::PlanGenerated,
            PipelineStage::Approved,
            PipelineStage::WorkbookGenerated,
            PipelineStage::Exported,
            PipelineStage::Exported,
            PipelineStage::Exported,
        ]
    );

    for key in [
        artifact_keys::SOURCE_UPLOAD,
        artifact_keys::NORMALIZED_PROJECT,
        artifact_keys::VALIDATION_REPORT,
        artifact_keys::COURSE_PLAN_MARKDOWN,
        artifact_keys::WORKBOOK_MARKDOWN,
    ] {
        assert!(run.artifact(key).is_some(), "missing artifact {key}");
    }
    let exports: Vec<ExportRecord> =
        serde_json::from_value(run.artifact(artifact_keys::EXPORTS).unwrap().clone()).unwrap();
    let names: Vec<_> = exports.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(names, ["course-plan.json", "course-plan.md", "workbook-draft.md"]);

    let stored_state = run.course_state.unwrap();
    assert!(stored_state.is_approved());
    assert!(stored_state.workbook.is_some());
    assert!(run.events.iter().all(|e| e.audit.duration_ms().is_some()));
}

/// A malformed upload is returned and recorded as a retriable failure.
#[test]
fn malformed_upload_is_recorded_as_failed() {
    let (_dir, store) = temp_store();
    let mut session = Session::start(&store, Settings::new()).unwrap();

    let err = session.upload(MALFORMED_UPLOAD).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Transform(TransformError::MalformedUpload(_))
    ));
    assert!(session.project().is_none());

    let run = session.record().unwrap();
    assert_eq!(run.status_of(PipelineStage::UploadReceived), StageStatus::Failed);
    let last = run.last_error.unwrap();
    assert_eq!(last.details.as_deref(), Some("Could not parse JSON upload"));
    assert_eq!(last.retriable, Some(true));
    assert_eq!(run.events.len(), 1);
    assert_eq!(run.events[0].message.as_deref(), Some("Upload parse failed"));

    assert!(matches!(
        session.generate_plan(Settings::new()),
        Err(SessionError::Precondition(_))
    ));

    session.upload(DEMO_UPLOAD).unwrap();
    let run = session.record().unwrap();
    assert!(run.last_error.is_none());
    assert_eq!(run.current_stage, Some(PipelineStage::Validated));
}

/// Warnings are recorded, and an empty project cannot be planned.
#[test]
fn validation_outcomes() {
    let (_dir, store) = temp_store();
    let mut session = Session::start(&store, Settings::new()).unwrap();
    let report = session.upload(&messy_upload().to_string()).unwrap();
    assert!(report.valid);
    assert_eq!(report.warnings.len(), 3);

    let mut empty = Session::start(&store, Settings::new()).unwrap();
    let report = empty.upload(r#"{ "projectName": "Nothing" }"#).unwrap();
    assert!(!report.valid);
    assert!(matches!(
        empty.generate_plan(Settings::new()),
        Err(SessionError::InvalidProject)
    ));
}

/// Edits after approval block the workbook until the plan is re-approved.
#[test]
fn edits_require_reapproval() {
    let (_dir, store) = temp_store();
    let mut session = Session::start(&store, Settings::new()).unwrap();
    session.upload(DEMO_UPLOAD).unwrap();
    session
        .generate_plan(demo_settings().with_workbook_depth(WorkbookDepth::Heavy))
        .unwrap();
    session.approve().unwrap();

    session
        .course_state_mut()
        .unwrap()
        .rename_module(0, "Getting Started")
        .unwrap();
    assert!(matches!(
        session.generate_workbook(),
        Err(SessionError::Transform(TransformError::NotApproved))
    ));
    assert!(matches!(
        session.export(ExportKind::CoursePlanMarkdown),
        Err(SessionError::Precondition(_))
    ));

    session.approve().unwrap();
    session.generate_workbook().unwrap();
    let workbook = session.export(ExportKind::WorkbookMarkdown).unwrap();
    assert!(workbook.content.contains("## Module 1: Getting Started"));
    assert!(workbook.content.contains("5. How can you apply"));
    assert_eq!(session.settings().workbook_depth, WorkbookDepth::Heavy);
}

/// Exporting the workbook before it exists fails; the store still guards skips.
#[test]
fn export_preconditions() {
    let (_dir, store) = temp_store();
    let mut session = Session::start(&store, Settings::new()).unwrap();
    session.upload(DEMO_UPLOAD).unwrap();
    session.generate_plan(Settings::new()).unwrap();
    session.approve().unwrap();

    assert!(matches!(
        session.export(ExportKind::WorkbookMarkdown),
        Err(SessionError::Precondition(_))
    ));
    let err = session.export(ExportKind::CoursePlanJson).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Store(StoreError::InvalidTransition {
            from: Some(PipelineStage::Approved),
            to: PipelineStage::Exported
        })
    ));
    assert!(err.is_caller_error());
}

/// A rejected advance leaves the session's plan as it was before the call.
#[test]
fn store_failure_keeps_previous_plan() {
    let (_dir, store) = temp_store();
    let mut session = Session::start(&store, Settings::new()).unwrap();
    session.upload(DEMO_UPLOAD).unwrap();
    session.generate_plan(Settings::new()).unwrap();

    let good = std::fs::read_to_string(store.path()).unwrap();
    std::fs::write(store.path(), "{ not json").unwrap();
    assert!(matches!(
        session.approve(),
        Err(SessionError::Store(StoreError::Serialization(_)))
    ));
    assert!(!session.course_state().unwrap().is_approved());

    std::fs::write(store.path(), &good).unwrap();
    session.approve().unwrap();
    std::fs::write(store.path(), "{ not json").unwrap();
    assert!(session.generate_workbook().is_err());
    let state = session.course_state().unwrap();
    assert!(state.is_approved());
    assert!(state.workbook.is_none());
}
