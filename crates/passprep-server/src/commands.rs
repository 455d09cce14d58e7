//! Command implementations behind the `passprep` binary

use crate::config::ServerConfig;
use crate::handlers::{build_router, AppState};
use anyhow::{bail, Context, Result};
use passprep_core::{DescriptionLength, Settings, TitleStyle, WorkbookDepth};
use passprep_run::{ExportKind, RunStore, Session};
use std::path::{Path, PathBuf};

/// Outcome of an offline `process` run
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub run_id: String,
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Serve the HTTP API until the process is stopped
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let store = RunStore::open(config.store_path());
    let app = build_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        store = %config.store_path().display(),
        "passprep server listening on http://{}",
        config.bind_addr
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// Drive a full session for `input`, auto-approving, and write every export to `out_dir`
pub fn process(
    config: &ServerConfig,
    input: &Path,
    out_dir: &Path,
    settings: Settings,
) -> Result<ProcessOutcome> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let store = RunStore::open(config.store_path());
    let mut session = Session::start(&store, settings.clone())?;
    let run_id = session.run_id().to_string();

    let report = session
        .upload(&text)
        .with_context(|| format!("run {run_id}: upload rejected"))?;
    if !report.valid {
        bail!("run {run_id}: {} has no videos", input.display());
    }
    let warnings = report.warnings.clone();
    for warning in &warnings {
        tracing::warn!(%run_id, "{warning}");
    }

    session.generate_plan(settings)?;
    session.approve()?;
    session.generate_workbook()?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let mut written = Vec::with_capacity(ExportKind::ALL.len());
    for kind in ExportKind::ALL {
        let file = session.export(kind)?;
        let path = out_dir.join(file.filename);
        std::fs::write(&path, file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }

    tracing::info!(%run_id, files = written.len(), "Processed project");
    Ok(ProcessOutcome {
        run_id,
        written,
        warnings,
    })
}

/// Stored run as pretty JSON
pub fn show(config: &ServerConfig, run_id: &str) -> Result<String> {
    let store = RunStore::open(config.store_path());
    match store.get_run(run_id)? {
        Some(run) => Ok(serde_json::to_string_pretty(&run)?),
        None => bail!("run not found: {run_id}"),
    }
}

pub fn parse_title_style(value: &str) -> Result<TitleStyle> {
    match value.to_ascii_lowercase().as_str() {
        "clear" | "clear-practical" | "clear&practical" | "clear & practical" => {
            Ok(TitleStyle::ClearPractical)
        }
        "academic" => Ok(TitleStyle::Academic),
        "inspirational" => Ok(TitleStyle::Inspirational),
        other => bail!("unknown title style '{other}'"),
    }
}

pub fn parse_description_length(value: &str) -> Result<DescriptionLength> {
    match value.to_ascii_lowercase().as_str() {
        "short" => Ok(DescriptionLength::Short),
        "medium" => Ok(DescriptionLength::Medium),
        "long" => Ok(DescriptionLength::Long),
        other => bail!("unknown description length '{other}'"),
    }
}

pub fn parse_workbook_depth(value: &str) -> Result<WorkbookDepth> {
    match value.to_ascii_lowercase().as_str() {
        "light" => Ok(WorkbookDepth::Light),
        "standard" => Ok(WorkbookDepth::Standard),
        "heavy" => Ok(WorkbookDepth::Heavy),
        other => bail!("unknown workbook depth '{other}'"),
    }
}
