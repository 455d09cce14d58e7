//! End-to-end tests for the transform pipeline.
//!
//! Guarantees exercised here:
//! - Planning partitions the project's videos: every id exactly once.
//! - Module count is clamped to `max(1, min(requested, videos or 1))`.
//! - Rendering is a pure function of the course state.
//! - Review edits on an approved plan always drop approval and workbook.

use chrono::{TimeZone, Utc};
use passprep_core::prelude::*;
use passprep_core::{FixedClock, Video, WorkbookDepth};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

fn project_with(count: usize) -> Project {
    let videos: Vec<serde_json::Value> = (0..count)
        .map(|i| json!({ "id": format!("v{i}"), "title": format!("T{i}"), "rawText": "Some words here." }))
        .collect();
    let raw = json!({ "projectName": "Prop Project", "videos": videos });
    normalize_project(&raw, &clock())
}

/// Two videos split across two modules render as an H1 plus ordinal headings.
#[test]
fn two_videos_two_modules_plan() {
    let raw = parse_upload(
        r#"{
            "projectName": "Networking 101",
            "videos": [
                { "id": "a", "title": "Packets", "rawText": "Packets move data. They have headers." },
                { "id": "b", "title": "Routing", "rawText": "Routers pick paths!" }
            ]
        }"#,
    )
    .unwrap();
    let project = normalize_project(&raw, &clock());
    let report = validate_project(&project);
    assert!(report.valid);
    assert!(report.warnings.is_empty());

    let state = build_course_state(&project, &Settings::new().with_module_count(2), &clock());
    assert_eq!(state.modules.len(), 2);
    assert!(state.modules.iter().all(|m| m.videos.len() == 1));

    let md = render_course_plan_markdown(&state);
    assert!(md.starts_with("# Networking 101\n"));
    assert!(md.contains("## Module 1"));
    assert!(md.contains("## Module 2"));
}

/// An approved plan at Standard depth yields three reflection questions per module.
#[test]
fn approved_plan_workbook_standard_depth() {
    let project = project_with(2);
    let mut state = build_course_state(
        &project,
        &Settings::new()
            .with_module_count(2)
            .with_workbook_depth(WorkbookDepth::Standard),
        &clock(),
    );
    state.approve();
    let workbook = state.attach_workbook(&clock()).unwrap();
    assert!(workbook
        .modules
        .iter()
        .all(|section| section.reflection_questions.len() == 3));

    let md = render_workbook_markdown(&state);
    assert!(md.contains("Workbook Draft"));
    assert!(md.contains("Reflection Questions"));
}

/// A project without videos still plans to exactly one empty module.
#[test]
fn empty_project_plans_single_module() {
    let project = normalize_project(&json!({}), &clock());
    let report = validate_project(&project);
    assert!(!report.valid);

    let state = build_course_state(&project, &Settings::new().with_module_count(5), &clock());
    assert_eq!(state.modules.len(), 1);
    assert!(state.modules[0].videos.is_empty());
    assert!(render_course_plan_markdown(&state).contains("## Module 1: Foundations"));
}

/// Rendering twice with the same state gives identical output.
#[test]
fn rendering_is_idempotent() {
    let mut state = build_course_state(&project_with(6), &Settings::new(), &clock());
    assert_eq!(
        render_course_plan_markdown(&state),
        render_course_plan_markdown(&state)
    );
    state.approve();
    state.attach_workbook(&clock()).unwrap();
    assert_eq!(
        render_workbook_markdown(&state),
        render_workbook_markdown(&state)
    );
}

/// Itemized validation reports one line per offense in detection order.
#[test]
fn itemized_warnings_in_detection_order() {
    let project = normalize_project(
        &json!({
            "videos": [
                { "id": "a", "title": "One", "rawText": "ok" },
                { "id": "a", "title": "Two", "rawText": "", "status": "failed" },
            ]
        }),
        &clock(),
    );
    let report = validate_project(&project);
    assert_eq!(
        report.warnings,
        vec![
            "Duplicate video id: a".to_string(),
            "Video a (\"Two\") is missing transcript text".to_string(),
            "Video a (\"Two\") has failed source status: failed".to_string(),
        ]
    );
}

/// Upload to report: the `name` alias names the project, and each video's
/// offenses are reported in video order, duplicates included.
#[test]
fn demo_upload_reports_offenses_per_video() {
    let raw = parse_upload(
        r#"{
            "name": "Demo",
            "videos": [
                { "id": "a", "title": "One", "rawText": "", "status": "completed" },
                { "id": "a", "title": "Two", "rawText": "hello", "status": "failed" }
            ]
        }"#,
    )
    .unwrap();
    let project = normalize_project(&raw, &clock());
    assert_eq!(project.project_name, "Demo");

    let report = validate_project(&project);
    assert!(report.valid);
    assert_eq!(report.video_count, 2);
    assert_eq!(
        report.warnings,
        vec![
            "Video a (\"One\") is missing transcript text".to_string(),
            "Duplicate video id: a".to_string(),
            "Video a (\"Two\") has failed source status: failed".to_string(),
        ]
    );
}

/// Editing an approved plan through each operation drops approval and workbook.
#[test]
fn edits_invalidate_approved_plan() {
    let base = {
        let mut state =
            build_course_state(&project_with(4), &Settings::new().with_module_count(2), &clock());
        state.approve();
        state.attach_workbook(&clock()).unwrap();
        state
    };

    let mut renamed = base.clone();
    renamed.rename_module(0, "Renamed").unwrap();
    let mut retitled = base.clone();
    retitled.set_video_title(1, 1, "New").unwrap();
    let mut moved = base.clone();
    moved.move_video(1, 0, 0).unwrap();

    for state in [renamed, retitled, moved] {
        assert!(!state.is_approved());
        assert!(state.workbook.is_none());
        assert_eq!(
            render_workbook_markdown(&state),
            passprep_core::WORKBOOK_PLACEHOLDER
        );
    }
}

/// Planning output serializes with camelCase wire names.
#[test]
fn course_state_wire_shape() {
    let project = normalize_project(
        &json!({ "videos": [{ "id": "a", "title": "A", "rawText": "x", "duration": "1:00" }] }),
        &clock(),
    );
    let state = build_course_state(&project, &Settings::new(), &clock());
    let value = serde_json::to_value(&state).unwrap();
    assert_eq!(value["schemaVersion"], "1.0.0");
    assert_eq!(value["metadata"]["approved"], false);
    assert_eq!(value["metadata"]["settings"]["moduleCount"], 4);
    assert_eq!(value["modules"][0]["videos"][0]["videoId"], "a");
    assert_eq!(value["modules"][0]["videos"][0]["duration"], "1:00");
    assert!(value["workbook"].is_null());

    let back: CourseState = serde_json::from_value(value).unwrap();
    assert_eq!(back, state);
}

proptest! {
    /// Every video lands in exactly one module, and module count is clamped.
    #[test]
    fn plan_partitions_videos(videos in 0usize..40, requested in 0usize..12) {
        let project = project_with(videos);
        let settings = Settings {
            module_count: requested,
            ..Settings::default()
        };
        let state = build_course_state(&project, &settings, &clock());

        let expected_modules = requested.min(videos.max(1)).max(1);
        prop_assert_eq!(state.modules.len(), expected_modules);

        let mut planned: Vec<String> = state.video_ids().map(str::to_string).collect();
        let mut source: Vec<String> = project.videos.iter().map(|v| v.id.clone()).collect();
        planned.sort();
        source.sort();
        prop_assert_eq!(planned, source);
    }

    /// Relative order inside each module follows upload order.
    #[test]
    fn plan_preserves_relative_order(videos in 1usize..30, requested in 1usize..8) {
        let project = project_with(videos);
        let state = build_course_state(
            &project,
            &Settings::new().with_module_count(requested),
            &clock(),
        );
        for module in &state.modules {
            let positions: Vec<usize> = module
                .videos
                .iter()
                .map(|v| v.video_id[1..].parse().unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    /// Moving videos between modules never duplicates or drops one.
    #[test]
    fn moves_keep_partition(moves in proptest::collection::vec((0usize..3, 0usize..5, 0usize..3), 0..20)) {
        let project = project_with(9);
        let mut state = build_course_state(&project, &Settings::new().with_module_count(3), &clock());
        for (from, index, to) in moves {
            let _ = state.move_video(from, index, to);
        }
        prop_assert_eq!(state.video_count(), 9);
        let mut ids: Vec<&str> = state.video_ids().collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), 9);
    }
}

#[test]
fn video_builder_roundtrips_through_planning() {
    let video = Video::new("x", "Title", "").with_duration("3:21");
    let planned = passprep_core::plan::plan_video(&video, &Settings::new());
    assert_eq!(planned.duration.as_deref(), Some("3:21"));
    assert_eq!(planned.generated_title, "Understanding Title");
}
