//! Project validation
//!
//! Warnings are itemized: one entry per offending video per issue, in
//! detection order. A report for a project without videos is invalid but is
//! still computed in full rather than short-circuited.

use crate::types::{Project, Video};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Outcome of validating a normalized project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// True iff the project has at least one video
    pub valid: bool,
    /// Project name echoed back for display
    pub project_name: String,
    /// Number of videos inspected
    pub video_count: usize,
    /// One line per detected issue
    pub warnings: Vec<String>,
}

/// A single detected issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A later video reuses an id already seen
    DuplicateId { id: String },
    /// Transcript text is empty
    EmptyTranscript { id: String, title: String },
    /// Upstream status mentions a failure
    FailedStatus {
        id: String,
        title: String,
        status: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "Duplicate video id: {id}"),
            Self::EmptyTranscript { id, title } => {
                write!(f, "Video {id} (\"{title}\") is missing transcript text")
            }
            Self::FailedStatus { id, title, status } => {
                write!(f, "Video {id} (\"{title}\") has failed source status: {status}")
            }
        }
    }
}

/// Collect every issue in a single pass over the videos.
///
/// Per video the checks run as duplicate id, empty transcript, failed status.
/// The first occurrence of an id is never a duplicate.
#[must_use]
pub fn detect_issues(project: &Project) -> Vec<ValidationIssue> {
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for video in &project.videos {
        if !seen.insert(video.id.as_str()) {
            issues.push(ValidationIssue::DuplicateId {
                id: video.id.clone(),
            });
        }
        if video.raw_text.trim().is_empty() {
            issues.push(ValidationIssue::EmptyTranscript {
                id: video.id.clone(),
                title: video.title.clone(),
            });
        }
        if has_failed_status(video) {
            issues.push(ValidationIssue::FailedStatus {
                id: video.id.clone(),
                title: video.title.clone(),
                status: video.status.clone().unwrap_or_default(),
            });
        }
    }

    issues
}

/// Validate a normalized project
#[must_use]
pub fn validate_project(project: &Project) -> ValidationReport {
    let warnings: Vec<String> = detect_issues(project)
        .iter()
        .map(ToString::to_string)
        .collect();

    let report = ValidationReport {
        valid: !project.videos.is_empty(),
        project_name: project.project_name.clone(),
        video_count: project.videos.len(),
        warnings,
    };

    tracing::debug!(
        valid = report.valid,
        videos = report.video_count,
        warnings = report.warnings.len(),
        "Validated project"
    );

    report
}

fn has_failed_status(video: &Video) -> bool {
    video
        .status
        .as_deref()
        .is_some_and(|status| status.to_lowercase().contains("fail"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceMetadata;
    use chrono::Utc;

    fn project(videos: Vec<Video>) -> Project {
        Project {
            project_name: "P".to_string(),
            source_metadata: SourceMetadata {
                source_file_type: "project.json".to_string(),
                imported_at: Utc::now(),
            },
            videos,
        }
    }

    #[test]
    fn clean_project_has_no_warnings() {
        let report = validate_project(&project(vec![
            Video::new("a", "A", "text").with_status("completed"),
            Video::new("b", "B", "more"),
        ]));
        assert!(report.valid);
        assert_eq!(report.video_count, 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_project_is_invalid() {
        let report = validate_project(&project(vec![]));
        assert!(!report.valid);
        assert_eq!(report.video_count, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn failed_status_is_case_insensitive_substring() {
        let issues = detect_issues(&project(vec![
            Video::new("a", "A", "t").with_status("JobFailed"),
            Video::new("b", "B", "t").with_status("FAIL"),
            Video::new("c", "C", "t").with_status("ok"),
        ]));
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|issue| matches!(issue, ValidationIssue::FailedStatus { .. })));
    }

    #[test]
    fn every_repeat_counts_as_duplicate() {
        let issues = detect_issues(&project(vec![
            Video::new("a", "1", "t"),
            Video::new("a", "2", "t"),
            Video::new("a", "3", "t"),
        ]));
        assert_eq!(
            issues,
            vec![
                ValidationIssue::DuplicateId { id: "a".into() },
                ValidationIssue::DuplicateId { id: "a".into() },
            ]
        );
    }

    #[test]
    fn warnings_are_itemized_not_summarized() {
        let report = validate_project(&project(vec![
            Video::new("a", "One", ""),
            Video::new("b", "Two", ""),
            Video::new("c", "Three", ""),
        ]));
        assert_eq!(report.warnings.len(), 3);
        assert!(report
            .warnings
            .iter()
            .all(|w| w.ends_with("is missing transcript text")));
        assert!(!report.warnings.iter().any(|w| w.contains("video(s)")));
    }
}
