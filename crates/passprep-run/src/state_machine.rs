use crate::error::StoreError;
use crate::model::PipelineStage;

/// Validates a stage transition.
///
/// A run may repeat its current stage, move exactly one stage forward, or
/// regress to any earlier stage. Skipping ahead is rejected. A run with no
/// stage yet may only enter the first one.
pub fn validate_transition(
    from: Option<PipelineStage>,
    to: PipelineStage,
) -> Result<(), StoreError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition { from, to })
    }
}

/// Every stage reachable from `from` in a single advance
pub fn allowed_targets(from: Option<PipelineStage>) -> Vec<PipelineStage> {
    PipelineStage::ALL
        .into_iter()
        .filter(|to| allowed(from, *to))
        .collect()
}

fn allowed(from: Option<PipelineStage>, to: PipelineStage) -> bool {
    let next = from.map_or(0, |stage| stage.index() + 1);
    to.index() <= next
}
