use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;

/// Pseudo-random probe placement with a structurally guaranteed gap.
///
/// The sequence is built from units of `probe_span + noprobe_span` flags:
/// a shuffled probe sub-span carrying exactly one `true`, followed by
/// `noprobe_span` fixed `false` flags. Consecutive probes therefore never
/// sit closer than `noprobe_span + 1` trials. Flags are consumed FIFO, one
/// per trial; whatever remains past the requested length is discarded with
/// the block, which can very rarely drop a generated probe near the
/// truncation boundary (inherited from the source design, not compensated).
#[derive(Debug, Clone)]
pub struct ProbeSchedule {
    flags: VecDeque<bool>,
    probe_span: usize,
    noprobe_span: usize,
}

impl ProbeSchedule {
    /// Build a schedule covering at least `trials` flags.
    ///
    /// `probe_span` must be >= 1; `ExperimentConfig::validate` rejects the
    /// invalid configuration before a schedule is ever built.
    pub fn generate<R: Rng + ?Sized>(
        probe_span: usize,
        noprobe_span: usize,
        trials: usize,
        rng: &mut R,
    ) -> Self {
        debug_assert!(probe_span >= 1, "rejected at configuration validation");
        let mut schedule = Self {
            flags: VecDeque::with_capacity(trials + probe_span + noprobe_span),
            probe_span,
            noprobe_span,
        };
        schedule.extend_to(trials, rng);
        schedule
    }

    /// Append whole units until the sequence covers `trials` flags.
    fn extend_to<R: Rng + ?Sized>(&mut self, trials: usize, rng: &mut R) {
        let mut unit = vec![false; self.probe_span];
        unit[0] = true;
        while self.flags.len() < trials {
            // One probe, uniform position, re-randomized per unit.
            unit.shuffle(rng);
            self.flags.extend(unit.iter().copied());
            self.flags
                .extend(std::iter::repeat(false).take(self.noprobe_span));
        }
    }

    /// Next flag, FIFO. Regenerates a fresh unit if the sequence ran dry.
    pub fn next_flag<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.flags.is_empty() {
            self.extend_to(1, rng);
        }
        self.flags.pop_front().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Remaining flags front to back, without consuming them.
    pub fn remaining(&self) -> impl Iterator<Item = bool> + '_ {
        self.flags.iter().copied()
    }
}
