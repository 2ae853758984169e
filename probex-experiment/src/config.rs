use probex_core::{NBACK_LETTERS, ProbeKind, SART_DIGITS};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Which block task the session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskKind {
    /// Go/no-go: respond to every digit except the target digit.
    Sart { target_digit: char },
    /// Letter n-back: respond when the current letter matches the one
    /// `n` trials back. Block lag depths cycle through `levels`.
    NBack { levels: Vec<u8> },
}

/// Session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub task: TaskKind,
    pub probe_condition: ProbeKind,

    pub trials_per_block: usize,
    pub blocks_per_experiment: usize,
    pub run_practice_blocks: bool,
    pub practice_blocks: usize,
    pub practice_trial_count: usize,

    pub stim_duration_ms: u64,
    pub trial_duration_ms: u64,
    pub feedback_duration_ms: u64,
    /// Hold the block message this long before accepting the start key.
    pub block_message_ms: u64,

    /// Unit sub-span that carries exactly one probe.
    pub probe_span: usize,
    /// Minimum trials between probes.
    pub noprobe_span: usize,

    pub stimulus_set: Vec<char>,
    /// (target, non-target) level weights for pre-sampling n-back flags.
    pub target_weight: (u32, u32),
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            task: TaskKind::Sart { target_digit: '3' },
            probe_condition: ProbeKind::Mason2007,
            trials_per_block: 9,
            blocks_per_experiment: 132,
            run_practice_blocks: true,
            practice_blocks: 2,
            practice_trial_count: 9,
            stim_duration_ms: 250,
            trial_duration_ms: 1150,
            feedback_duration_ms: 1500,
            block_message_ms: 2000,
            probe_span: 48,
            noprobe_span: 18,
            stimulus_set: SART_DIGITS.to_vec(),
            target_weight: (1, 5),
        }
    }
}

impl ExperimentConfig {
    /// Defaults for the letter n-back variant, alternating 1-back and
    /// 2-back blocks.
    pub fn nback() -> Self {
        Self {
            task: TaskKind::NBack { levels: vec![1, 2] },
            stimulus_set: NBACK_LETTERS.to_vec(),
            ..Self::default()
        }
    }

    pub fn total_experiment_trials(&self) -> usize {
        self.trials_per_block * self.blocks_per_experiment
    }

    /// Lag depth for the n-th experiment block (1-based), cycling through
    /// the configured levels. Zero for the go/no-go task.
    pub fn nback_level(&self, phase_block: usize) -> u8 {
        match &self.task {
            TaskKind::Sart { .. } => 0,
            TaskKind::NBack { levels } => {
                if levels.is_empty() {
                    0
                } else {
                    levels[(phase_block.saturating_sub(1)) % levels.len()]
                }
            }
        }
    }

    /// Fatal configuration checks, run once before the first trial.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_span < 1 {
            return Err(ConfigError::InvalidProbeSpan(self.probe_span));
        }
        if self.trials_per_block < 1 {
            return Err(ConfigError::NoTrials);
        }
        if self.blocks_per_experiment < 1 {
            return Err(ConfigError::NoBlocks);
        }
        if self.stimulus_set.is_empty() {
            return Err(ConfigError::EmptyStimulusSet);
        }
        match &self.task {
            TaskKind::Sart { target_digit } => {
                if !self.stimulus_set.contains(target_digit) {
                    return Err(ConfigError::TargetNotInSet(*target_digit));
                }
            }
            TaskKind::NBack { levels } => {
                if levels.is_empty() {
                    return Err(ConfigError::NoNbackLevels);
                }
                if let Some(&bad) = levels.iter().find(|l| !(1..=2).contains(*l)) {
                    return Err(ConfigError::InvalidNbackLevel(bad));
                }
                if self.target_weight.1 == 0 {
                    return Err(ConfigError::ZeroNonTargetWeight);
                }
            }
        }

        // trials_per_block * blocks should be a multiple of the span unit,
        // otherwise the tail unit is truncated (slightly lowering the
        // effective probe rate near the session boundary).
        let unit = self.probe_span + self.noprobe_span;
        if unit > 0 && self.total_experiment_trials() % unit != 0 {
            warn!(
                total = self.total_experiment_trials(),
                unit, "session length is not a multiple of the probe span unit"
            );
        }
        Ok(())
    }
}
