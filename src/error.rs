use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("failed to read combos from {path}: {source}")]
    ReadCombos {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed combo definitions: {0}")]
    ParseCombos(#[from] serde_json::Error),

    #[error("bundled combo definitions are missing")]
    MissingBundledCombos,

    #[error("no playable combos were loaded")]
    EmptyLibrary,

    /// The input channel broke mid-game; nothing can be recovered.
    #[error("input transport failed: {0}")]
    Input(#[source] io::Error),

    /// A fatal error hit mid-session, with the score banked up to that point.
    #[error("session aborted at {score} points: {source}")]
    Aborted {
        score: i64,
        elapsed: Duration,
        #[source]
        source: Box<GameError>,
    },

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

impl GameError {
    /// Score to report for a failed play invocation
    pub fn banked_score(&self) -> i64 {
        self.banked_score_and_secs().0
    }

    /// Score and elapsed seconds to report for a failed play invocation
    pub fn banked_score_and_secs(&self) -> (i64, f64) {
        match self {
            GameError::Aborted { score, elapsed, .. } => (*score, elapsed.as_secs_f64()),
            _ => (0, 0.0),
        }
    }
}
