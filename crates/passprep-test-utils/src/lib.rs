//! Testing utilities for PassPrep workspace
//!
//! Shared fixtures: sample uploads, settings, a frozen clock and stores in
//! throwaway directories.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use passprep_core::{normalize_project, FixedClock, Project, Settings};
use passprep_run::RunStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Upload with three videos in canonical key form
pub const DEMO_UPLOAD: &str = r#"{
  "projectName": "Exam Sprint",
  "videos": [
    {
      "id": "v1",
      "title": "Reading the Syllabus",
      "rawText": "Start by mapping every topic on the syllabus. Then rank them by weight.",
      "duration": "6:30",
      "status": "completed"
    },
    {
      "id": "v2",
      "title": "Spaced Repetition",
      "rawText": "Review material at growing intervals! It beats cramming.",
      "duration": "8:05",
      "status": "completed"
    },
    {
      "id": "v3",
      "title": "Mock Exams",
      "rawText": "Sit full mock exams under timed conditions?",
      "status": "completed"
    }
  ]
}"#;

/// Text that is not JSON
pub const MALFORMED_UPLOAD: &str = r#"{ "projectName": "Broken", "videos": [ "#;

pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
}

pub fn fixed_clock() -> FixedClock {
    FixedClock::new(fixed_instant())
}

/// Upload whose videos trip every validation check
pub fn messy_upload() -> Value {
    json!({
        "name": "Messy",
        "items": [
            { "videoId": "dup", "name": "First", "transcript": "fine" },
            { "videoId": "dup", "name": "Second", "transcript": "", "jobStatus": "FAILED" }
        ]
    })
}

/// Canonical upload with `count` videos named `v1..=count`
pub fn upload_with_videos(count: usize) -> Value {
    let videos: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "id": format!("v{i}"),
                "title": format!("Lesson {i}"),
                "rawText": format!("Lesson {i} covers topic number {i}. Practice it daily.")
            })
        })
        .collect();
    json!({ "projectName": "Generated Course", "videos": videos })
}

pub fn demo_project() -> Project {
    let raw: Value = serde_json::from_str(DEMO_UPLOAD).unwrap();
    normalize_project(&raw, &fixed_clock())
}

pub fn demo_settings() -> Settings {
    Settings::new().with_module_count(2)
}

/// Store in a fresh temp directory with a frozen clock.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn temp_store() -> (TempDir, RunStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = RunStore::with_clock(dir.path().join("runs.json"), Arc::new(fixed_clock()));
    (dir, store)
}
