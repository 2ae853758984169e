use rand::Rng;
use rand::seq::SliceRandom;

use crate::targets::TargetPool;

/// Repeat `base` until it covers `len`, shuffle, truncate.
///
/// The standard per-block sequence builder: keeps the base distribution as
/// balanced as the block length allows.
pub fn cycled_shuffled<T: Copy, R: Rng + ?Sized>(base: &[T], len: usize, rng: &mut R) -> Vec<T> {
    let mut seq = Vec::with_capacity(len + base.len());
    while seq.len() < len {
        seq.extend_from_slice(base);
    }
    seq.shuffle(rng);
    seq.truncate(len);
    seq
}

/// Everything one block owns: the rolling stimulus history, the remaining
/// pre-sampled target flags, and the per-trial presentation sequences.
/// Nothing here outlives the block.
#[derive(Debug, Clone)]
pub struct BlockContext {
    /// 1-based position in the session, practice blocks included.
    pub block_num: usize,
    pub practicing: bool,
    pub trials: usize,
    pub trials_done: usize,
    /// Lag depth for this block; zero for the go/no-go task.
    pub nback: u8,
    /// Stimulus sizes, popped one per trial.
    pub sizes: Vec<f32>,
    /// Balanced glyph sequence for the go/no-go task, popped one per trial.
    pub glyphs: Option<Vec<char>>,
    /// Remaining pre-sampled target flags (n-back only).
    pub targets: Option<TargetPool>,
    /// Stimulus identities since the last probe.
    pub history: Vec<char>,
}

impl BlockContext {
    /// Record a completed presentation. Probes break n-back continuity, so
    /// a probe trial clears the history instead of extending it.
    pub fn record_presented(&mut self, probe_trial: bool, glyph: char) {
        if probe_trial {
            self.history.clear();
        } else {
            self.history.push(glyph);
        }
    }

    /// The identity a target would have to repeat, if the history reaches
    /// back far enough.
    pub fn nback_match(&self, nback: u8) -> Option<char> {
        self.history
            .len()
            .checked_sub(nback as usize)
            .and_then(|i| self.history.get(i))
            .copied()
    }
}
