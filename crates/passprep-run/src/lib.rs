//! PassPrep Run - auditable run ledger
//!
//! Records each pipeline attempt as a [`RunRecord`] persisted in a single JSON
//! document:
//! - Fixed seven-stage pipeline with a repeat, one-forward or regress rule
//! - Shallow-merged artifacts and wholesale course-state replacement
//! - Append-only event history with opaque audit figures
//! - Version-checked atomic writes
//!
//! [`Session`] drives the transform pipeline and reports every step here.
//!
//! # Example
//!
//! ```rust,ignore
//! use passprep_run::{RunStore, Session, ExportKind};
//!
//! let store = RunStore::in_dir(".data");
//! let mut session = Session::start(&store, Settings::new())?;
//! session.upload(&text)?;
//! session.generate_plan(Settings::new())?;
//! session.approve()?;
//! session.generate_workbook()?;
//! let file = session.export(ExportKind::WorkbookMarkdown)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod model;
pub mod session;
pub mod state_machine;
pub mod store;

pub use error::{SessionError, StoreError};
pub use model::{
    create_empty_run, Audit, LastError, PipelineStage, RunDb, RunEvent, RunRecord, StageError,
    StageStatus, UnknownStage,
};
pub use session::{ExportFile, ExportFormat, ExportKind, ExportRecord, Session};
pub use state_machine::{allowed_targets, validate_transition};
pub use store::{AdvanceParams, RunStore, STORE_FILE_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
