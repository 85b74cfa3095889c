//! Ranking error types.

use thiserror::Error;

pub use offerrank_metrics::PluginFailureKind as RankingErrorKind;

/// Errors from the ranking plugin exchange and reconciliation.
///
/// The orchestrator handles every variant the same way (local fallback);
/// the kind only matters for logging and metrics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RankingError {
    #[error("ranking plugin transport failure: {0}")]
    Transport(String),

    #[error("undecodable ranking plugin response: {0}")]
    Decode(String),

    #[error("ranking plugin reported an error: {0}")]
    PluginReported(String),
}

impl RankingError {
    pub fn kind(&self) -> RankingErrorKind {
        match self {
            RankingError::Transport(_) => RankingErrorKind::Transport,
            RankingError::Decode(_) => RankingErrorKind::Decode,
            RankingError::PluginReported(_) => RankingErrorKind::PluginReported,
        }
    }
}

pub type RankingResult<T> = Result<T, RankingError>;
