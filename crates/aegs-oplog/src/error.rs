//! Error types for the delta log.

use crate::log::SeqNo;
use thiserror::Error;

/// Errors that can occur when reading a range out of the log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The range starts before the oldest retained entry; that history has
    /// been truncated away. Recovered by sending a full-state snapshot
    /// instead of incremental deltas.
    #[error("range {from}..{to} starts before the log's low-water mark {low}")]
    Gap { from: SeqNo, to: SeqNo, low: SeqNo },

    /// The range reaches past the newest entry.
    #[error("range {from}..{to} extends past the log head {head}")]
    OutOfRange { from: SeqNo, to: SeqNo, head: SeqNo },
}
