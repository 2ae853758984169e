use thiserror::Error;

/// Configuration problems caught at startup validation, before any trial.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("probe_span must be at least 1 (got {0})")]
    InvalidProbeSpan(usize),
    #[error("trials_per_block must be at least 1")]
    NoTrials,
    #[error("blocks_per_experiment must be at least 1")]
    NoBlocks,
    #[error("stimulus set must not be empty")]
    EmptyStimulusSet,
    #[error("SART target digit {0:?} is not in the stimulus set")]
    TargetNotInSet(char),
    #[error("n-back levels must not be empty")]
    NoNbackLevels,
    #[error("n-back level must be 1 or 2 (got {0})")]
    InvalidNbackLevel(u8),
    #[error("non-target weight must be nonzero")]
    ZeroNonTargetWeight,
}
