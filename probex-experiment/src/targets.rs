use rand::Rng;
use rand::seq::SliceRandom;

/// Outcome of feasibility-checking one pre-sampled target flag.
///
/// `Recycled` is a retry signal to the trial scheduler, not an error: the
/// drawn flag goes back into the pool and the slot is prepared again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// The flag is realizable as drawn.
    Accepted,
    /// Forced to non-target for this slot only, to guarantee termination.
    Downgraded,
    /// Return the flag to the pool, reshuffle the remainder, redraw.
    Recycled,
}

/// Decide whether a pre-assigned target flag can be realized against the
/// rolling stimulus history.
///
/// A target needs a stimulus `nback` trials back; when the history (reset
/// at every probe) is still too short, the flag is recycled while enough
/// of the block remains to absorb the re-draw, and downgraded once
/// `trial_number` passes `(1 - nback_rate) * trials_per_block`.
pub fn evaluate_target(
    is_target: bool,
    history_len: usize,
    nback: u8,
    trial_number: usize,
    trials_per_block: usize,
    nback_rate: f64,
) -> TargetOutcome {
    if !is_target || history_len >= nback as usize {
        return TargetOutcome::Accepted;
    }
    let cutoff = (1.0 - nback_rate) * trials_per_block as f64;
    if (trial_number as f64) < cutoff {
        TargetOutcome::Recycled
    } else {
        TargetOutcome::Downgraded
    }
}

/// Pre-sampled target flags for one block, drawn front-first.
///
/// Sampling mirrors the independent-variable expansion: the weighted level
/// list (`target_weight` copies of `true`/`false`) is repeated until it
/// covers the block, shuffled, then truncated.
#[derive(Debug, Clone)]
pub struct TargetPool {
    remaining: Vec<bool>,
}

impl TargetPool {
    pub fn sample<R: Rng + ?Sized>(
        trials: usize,
        target_weight: (u32, u32),
        rng: &mut R,
    ) -> Self {
        let mut levels = Vec::with_capacity((target_weight.0 + target_weight.1) as usize);
        levels.extend(std::iter::repeat(true).take(target_weight.0 as usize));
        levels.extend(std::iter::repeat(false).take(target_weight.1 as usize));

        let mut remaining = Vec::with_capacity(trials + levels.len());
        while remaining.len() < trials {
            remaining.extend_from_slice(&levels);
        }
        remaining.shuffle(rng);
        remaining.truncate(trials);
        Self { remaining }
    }

    pub fn draw(&mut self) -> Option<bool> {
        if self.remaining.is_empty() {
            None
        } else {
            Some(self.remaining.remove(0))
        }
    }

    /// Return a recycled flag and reshuffle what is left undrawn.
    pub fn recycle<R: Rng + ?Sized>(&mut self, flag: bool, rng: &mut R) {
        self.remaining.push(flag);
        self.remaining.shuffle(rng);
    }

    /// True if a non-target flag is still drawable. When this goes false
    /// while the history is too short, recycling can never succeed and the
    /// slot must be downgraded instead.
    pub fn has_nontarget(&self) -> bool {
        self.remaining.iter().any(|&f| !f)
    }

    pub fn target_count(&self) -> usize {
        self.remaining.iter().filter(|&&f| f).count()
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Fraction of `true` flags across a set of pre-sampled pools. Derived
/// once per session, before any flag is consumed.
pub fn target_rate(pools: &[TargetPool]) -> f64 {
    let total: usize = pools.iter().map(TargetPool::len).sum();
    if total == 0 {
        return 0.0;
    }
    let targets: usize = pools.iter().map(TargetPool::target_count).sum();
    targets as f64 / total as f64
}
