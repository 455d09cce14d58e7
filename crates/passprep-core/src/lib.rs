//! PassPrep Core - deterministic course transforms
//!
//! Turns an uploaded video project into a course plan and workbook:
//! - Normalizes loosely shaped upload JSON into a canonical project
//! - Validates the project and itemizes warnings
//! - Partitions videos into themed modules with generated titles and descriptions
//! - Applies review edits that invalidate approval
//! - Derives a workbook from an approved plan
//! - Renders both as Markdown
//!
//! Nothing here performs I/O. Timestamps come from an injected [`Clock`].
//!
//! # Example
//!
//! ```rust,ignore
//! use passprep_core::prelude::*;
//!
//! let raw = parse_upload(text)?;
//! let project = normalize_project(&raw, &SystemClock);
//! let mut state = build_course_state(&project, &Settings::new(), &SystemClock);
//! state.approve();
//! state.attach_workbook(&SystemClock)?;
//! println!("{}", render_workbook_markdown(&state));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod clock;
pub mod error;
pub mod normalize;
pub mod plan;
pub mod render;
pub mod text;
pub mod types;
pub mod validate;
pub mod workbook;

pub use clock::{display_timestamp, Clock, FixedClock, SystemClock};
pub use error::TransformError;
pub use normalize::{normalize_project, parse_upload};
pub use plan::{
    build_course_state, chunk_round_robin, CourseMetadata, CourseModule, CourseState, CourseVideo,
    COURSE_SCHEMA_VERSION, MODULE_THEMES,
};
pub use render::{render_course_plan_markdown, render_workbook_markdown, WORKBOOK_PLACEHOLDER};
pub use types::{
    coerce_module_count, DescriptionLength, Project, Settings, SourceMetadata, TitleStyle, Video,
    WorkbookDepth, DEFAULT_MODULE_COUNT,
};
pub use validate::{validate_project, ValidationIssue, ValidationReport};
pub use workbook::{build_workbook, Workbook, WorkbookSection};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the transform pipeline
    pub use crate::{
        build_course_state, build_workbook, normalize_project, parse_upload,
        render_course_plan_markdown, render_workbook_markdown, validate_project, Clock,
        CourseState, Project, Settings, SystemClock, TransformError, ValidationReport,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
