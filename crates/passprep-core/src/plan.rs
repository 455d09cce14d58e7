//! Course plan generation and review edits
//!
//! A [`CourseState`] is built from a normalized project by round-robin
//! partitioning its videos into modules. It is then edited by the user and
//! approved. Two invariants hold throughout:
//! - The modules' videos are a partition of the project's videos: every video
//!   appears in exactly one module, never duplicated, never dropped.
//! - `workbook` is `None` whenever `approved` is false. Every edit clears both.

use crate::clock::Clock;
use crate::error::TransformError;
use crate::text::first_words;
use crate::types::{DescriptionLength, Project, Settings, Video};
use crate::workbook::{build_workbook, Workbook};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version stamped on generated course states
pub const COURSE_SCHEMA_VERSION: &str = "1.0.0";

/// Rotating module themes, cycled by module index
pub const MODULE_THEMES: [&str; 5] = [
    "Foundations",
    "Core Skills",
    "Applied Practice",
    "Integration",
    "Mastery",
];

/// Transcript words used as the base of a generated title
pub const TITLE_WORDS: usize = 8;

/// A source video as planned inside a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseVideo {
    /// Id of the source video (reference only)
    pub video_id: String,
    /// Title of the source video
    pub source_title: String,
    /// Duration carried over from the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Editable generated title
    pub generated_title: String,
    /// Editable generated description
    pub generated_description: String,
}

/// A module of the course plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    /// Stable id assigned at generation (`module-N`)
    pub id: String,
    /// Editable title
    pub title: String,
    /// Videos in presentation order
    pub videos: Vec<CourseVideo>,
}

/// Plan-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMetadata {
    /// Project name copied from the source project
    pub project_name: String,
    /// When the plan was generated
    pub generated_at: DateTime<Utc>,
    /// Whether the user approved the plan as it stands
    pub approved: bool,
    /// Settings snapshot used for generation, owned by this plan
    pub settings: Settings,
}

/// The editable course plan and, once approved, its workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseState {
    /// Document schema version
    pub schema_version: String,
    /// Plan metadata
    pub metadata: CourseMetadata,
    /// Modules in presentation order
    pub modules: Vec<CourseModule>,
    /// Workbook derived from the approved plan
    pub workbook: Option<Workbook>,
}

/// Partition `items` into `max(1, min(requested, len or 1))` buckets by
/// `index % bucket_count`, keeping relative order inside each bucket.
#[must_use]
pub fn chunk_round_robin<T: Clone>(items: &[T], requested: usize) -> Vec<Vec<T>> {
    let count = requested.min(items.len().max(1)).max(1);
    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); count];
    for (index, item) in items.iter().enumerate() {
        buckets[index % count].push(item.clone());
    }
    buckets
}

/// Theme label for the module at `index`
#[inline]
#[must_use]
pub fn module_theme(index: usize) -> &'static str {
    MODULE_THEMES[index % MODULE_THEMES.len()]
}

/// Generated title and description for one source video
#[must_use]
pub fn plan_video(video: &Video, settings: &Settings) -> CourseVideo {
    let from_transcript = first_words(&video.raw_text, TITLE_WORDS);
    let base = if from_transcript.is_empty() {
        video.title.clone()
    } else {
        from_transcript
    };
    let lowered = base.to_lowercase();

    let generated_description = match settings.description_length {
        DescriptionLength::Short => format!("Introduces {lowered} and practical takeaways."),
        DescriptionLength::Medium => format!(
            "Introduces {lowered}, explains key context, and highlights practical application for learners."
        ),
        DescriptionLength::Long => format!(
            "Introduces {lowered}, provides contextual explanation, and outlines practical implementation steps that can be applied immediately."
        ),
    };

    CourseVideo {
        video_id: video.id.clone(),
        source_title: video.title.clone(),
        duration: video.duration.clone(),
        generated_title: format!("{} {}", settings.title_style.prefix(), base),
        generated_description,
    }
}

/// Build an unapproved course plan from a project.
///
/// Generated text is a pure function of each video and the settings; only
/// `generated_at` depends on the clock.
#[must_use]
pub fn build_course_state(project: &Project, settings: &Settings, clock: &dyn Clock) -> CourseState {
    let buckets = chunk_round_robin(&project.videos, settings.effective_module_count());

    let modules: Vec<CourseModule> = buckets
        .iter()
        .enumerate()
        .map(|(index, videos)| CourseModule {
            id: format!("module-{}", index + 1),
            title: format!("Module {}: {}", index + 1, module_theme(index)),
            videos: videos.iter().map(|video| plan_video(video, settings)).collect(),
        })
        .collect();

    tracing::debug!(
        modules = modules.len(),
        videos = project.videos.len(),
        "Built course plan"
    );

    CourseState {
        schema_version: COURSE_SCHEMA_VERSION.to_string(),
        metadata: CourseMetadata {
            project_name: project.project_name.clone(),
            generated_at: clock.now(),
            approved: false,
            settings: settings.clone(),
        },
        modules,
        workbook: None,
    }
}

impl CourseState {
    /// Whether the plan is currently approved
    #[inline]
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.metadata.approved
    }

    /// Ids of all planned videos in module order
    pub fn video_ids(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .flat_map(|module| module.videos.iter().map(|video| video.video_id.as_str()))
    }

    /// Total number of planned videos
    #[must_use]
    pub fn video_count(&self) -> usize {
        self.modules.iter().map(|module| module.videos.len()).sum()
    }

    /// Mark the plan approved
    pub fn approve(&mut self) {
        self.metadata.approved = true;
    }

    /// Generate and attach a workbook; requires approval
    pub fn attach_workbook(&mut self, clock: &dyn Clock) -> Result<&Workbook, TransformError> {
        if !self.metadata.approved {
            return Err(TransformError::NotApproved);
        }
        let workbook = build_workbook(self, clock);
        Ok(self.workbook.insert(workbook))
    }

    /// Rename a module
    pub fn rename_module(
        &mut self,
        module_index: usize,
        title: impl Into<String>,
    ) -> Result<(), TransformError> {
        self.module_mut(module_index)?.title = title.into();
        self.invalidate();
        Ok(())
    }

    /// Swap a module with its predecessor; the first module stays put
    pub fn move_module_up(&mut self, module_index: usize) -> Result<(), TransformError> {
        self.check_module(module_index)?;
        if module_index > 0 {
            self.modules.swap(module_index - 1, module_index);
        }
        self.invalidate();
        Ok(())
    }

    /// Swap a module with its successor; the last module stays put
    pub fn move_module_down(&mut self, module_index: usize) -> Result<(), TransformError> {
        self.check_module(module_index)?;
        if module_index + 1 < self.modules.len() {
            self.modules.swap(module_index, module_index + 1);
        }
        self.invalidate();
        Ok(())
    }

    /// Replace a video's generated title
    pub fn set_video_title(
        &mut self,
        module_index: usize,
        video_index: usize,
        title: impl Into<String>,
    ) -> Result<(), TransformError> {
        self.video_mut(module_index, video_index)?.generated_title = title.into();
        self.invalidate();
        Ok(())
    }

    /// Replace a video's generated description
    pub fn set_video_description(
        &mut self,
        module_index: usize,
        video_index: usize,
        description: impl Into<String>,
    ) -> Result<(), TransformError> {
        self.video_mut(module_index, video_index)?.generated_description = description.into();
        self.invalidate();
        Ok(())
    }

    /// Move a video to the end of another module.
    ///
    /// Moving within the same module is a no-op and keeps approval.
    pub fn move_video(
        &mut self,
        from_module: usize,
        video_index: usize,
        to_module: usize,
    ) -> Result<(), TransformError> {
        self.video_mut(from_module, video_index)?;
        self.check_module(to_module)?;
        if from_module == to_module {
            return Ok(());
        }
        let moved = self.modules[from_module].videos.remove(video_index);
        self.modules[to_module].videos.push(moved);
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.metadata.approved = false;
        self.workbook = None;
    }

    fn check_module(&self, module_index: usize) -> Result<(), TransformError> {
        if module_index < self.modules.len() {
            Ok(())
        } else {
            Err(TransformError::module_out_of_range(
                module_index,
                self.modules.len(),
            ))
        }
    }

    fn module_mut(&mut self, module_index: usize) -> Result<&mut CourseModule, TransformError> {
        let len = self.modules.len();
        self.modules
            .get_mut(module_index)
            .ok_or_else(|| TransformError::module_out_of_range(module_index, len))
    }

    fn video_mut(
        &mut self,
        module_index: usize,
        video_index: usize,
    ) -> Result<&mut CourseVideo, TransformError> {
        let module = self.module_mut(module_index)?;
        let len = module.videos.len();
        module
            .videos
            .get_mut(video_index)
            .ok_or_else(|| TransformError::video_out_of_range(video_index, len))
    }
}
