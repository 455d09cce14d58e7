//! Markdown renderers for the course plan and workbook
//!
//! Both are total: any `CourseState` renders, and rendering the same state
//! twice yields the same text. Module headings always number by position.

use crate::clock::display_timestamp;
use crate::plan::CourseState;
use crate::text::strip_module_prefix;
use std::fmt::Write;

/// Document produced when no workbook has been generated
pub const WORKBOOK_PLACEHOLDER: &str = "# Workbook Draft\n\n_Not generated._\n";

/// Render the course plan
#[must_use]
pub fn render_course_plan_markdown(state: &CourseState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", state.metadata.project_name);
    out.push('\n');
    let _ = writeln!(
        out,
        "Generated: {}",
        display_timestamp(&state.metadata.generated_at)
    );
    out.push('\n');

    for (index, module) in state.modules.iter().enumerate() {
        let _ = writeln!(
            out,
            "## Module {}: {}",
            index + 1,
            strip_module_prefix(&module.title)
        );
        out.push('\n');
        for video in &module.videos {
            let _ = writeln!(out, "### Video: {}", video.generated_title);
            let _ = writeln!(out, "Description: {}", video.generated_description);
            let _ = writeln!(
                out,
                "Duration: {}",
                video.duration.as_deref().unwrap_or("N/A")
            );
            out.push('\n');
        }
        out.push_str("---\n\n");
    }

    out
}

/// Render the workbook, or [`WORKBOOK_PLACEHOLDER`] when there is none
#[must_use]
pub fn render_workbook_markdown(state: &CourseState) -> String {
    let Some(workbook) = &state.workbook else {
        return WORKBOOK_PLACEHOLDER.to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "# {} - Workbook Draft", state.metadata.project_name);
    out.push('\n');

    for (index, section) in workbook.modules.iter().enumerate() {
        let _ = writeln!(
            out,
            "## Module {}: {}",
            index + 1,
            strip_module_prefix(&section.module_title)
        );
        out.push('\n');

        out.push_str("#### Summary\n");
        let _ = writeln!(out, "{}", section.summary);
        out.push('\n');

        out.push_str("#### Key Ideas\n");
        for idea in &section.key_ideas {
            let _ = writeln!(out, "- {idea}");
        }
        out.push('\n');

        out.push_str("#### Reflection Questions\n");
        for (i, question) in section.reflection_questions.iter().enumerate() {
            let _ = writeln!(out, "{}. {question}", i + 1);
        }
        out.push('\n');

        out.push_str("#### Exercise\n");
        let _ = writeln!(out, "{}", section.exercise);
        out.push('\n');

        out.push_str("#### Action Steps\n");
        for (i, step) in section.action_steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {step}", i + 1);
        }
        out.push('\n');
    }

    out
}
