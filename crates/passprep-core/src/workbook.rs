//! Workbook derivation from an approved course plan

use crate::clock::Clock;
use crate::plan::{CourseModule, CourseState};
use crate::text::{first_sentence, first_words};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed action steps appended to every section
pub const ACTION_STEPS: [&str; 3] = [
    "Identify one concept to implement this week.",
    "Document your implementation outcome.",
    "Share feedback with your team.",
];

/// Study material for one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSection {
    pub module_id: String,
    pub module_title: String,
    pub video_ids: Vec<String>,
    pub summary: String,
    pub key_ideas: Vec<String>,
    pub reflection_questions: Vec<String>,
    pub exercise: String,
    pub action_steps: Vec<String>,
}

/// Workbook draft, one section per module in plan order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub generated_at: DateTime<Utc>,
    pub modules: Vec<WorkbookSection>,
}

/// Derive a workbook from a course plan.
///
/// Does not check approval itself; [`CourseState::attach_workbook`] does.
#[must_use]
pub fn build_workbook(state: &CourseState, clock: &dyn Clock) -> Workbook {
    let count = state.metadata.settings.workbook_depth.question_count();
    Workbook {
        generated_at: clock.now(),
        modules: state
            .modules
            .iter()
            .map(|module| build_section(module, count))
            .collect(),
    }
}

fn build_section(module: &CourseModule, count: usize) -> WorkbookSection {
    let (title, seed) = match module.videos.first() {
        Some(video) => (
            video.generated_title.as_str(),
            format!("{}. {}", video.generated_title, video.generated_description),
        ),
        None => (module.title.as_str(), module.title.clone()),
    };

    let summary = first_sentence(&seed);
    let focus = first_words(title, 4).to_lowercase();

    WorkbookSection {
        module_id: module.id.clone(),
        module_title: module.title.clone(),
        video_ids: module.videos.iter().map(|v| v.video_id.clone()).collect(),
        key_ideas: (1..=count)
            .map(|i| format!("{i}. {summary} (focus area {i})"))
            .collect(),
        reflection_questions: (1..=count)
            .map(|i| format!("How can you apply {focus} in scenario {i}?"))
            .collect(),
        exercise: format!(
            "Complete a short exercise mapping {} to your current project context.",
            first_words(title, 5).to_lowercase()
        ),
        action_steps: ACTION_STEPS.iter().map(ToString::to_string).collect(),
        summary,
    }
}
