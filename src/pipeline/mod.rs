use crate::error::Result;

pub mod match_stage;
pub mod merge_stage;
pub mod split_stage;

pub use match_stage::{MatchConfig, MatchSummary};
pub use merge_stage::{MergeConfig, MergeSummary};
pub use split_stage::{SplitConfig, SplitSummary};

/// Turns a recoverable error into `None` after logging it; fatal errors pass through.
pub(crate) fn recoverable<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_recoverable() => {
            log::warn!("skipping: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
