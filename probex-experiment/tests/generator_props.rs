use probex_experiment::schedule::ProbeSchedule;
use probex_experiment::targets::{TargetOutcome, TargetPool, evaluate_target};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

proptest! {
    #[test]
    fn schedule_covers_request_and_units_hold_one_probe(
        probe_span in 1usize..60,
        noprobe_span in 0usize..30,
        trials in 0usize..600,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let schedule = ProbeSchedule::generate(probe_span, noprobe_span, trials, &mut rng);
        let flags: Vec<bool> = schedule.remaining().collect();

        prop_assert!(flags.len() >= trials);
        // Generation happens in whole units.
        prop_assert_eq!(flags.len() % (probe_span + noprobe_span), 0);

        for unit in flags.chunks_exact(probe_span + noprobe_span) {
            prop_assert_eq!(unit.iter().filter(|&&f| f).count(), 1);
            let pos = unit.iter().position(|&f| f).unwrap();
            prop_assert!(pos < probe_span);
        }
    }

    #[test]
    fn consecutive_probes_respect_the_minimum_gap(
        probe_span in 1usize..60,
        noprobe_span in 0usize..30,
        trials in 1usize..600,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut schedule = ProbeSchedule::generate(probe_span, noprobe_span, trials, &mut rng);

        let mut last_probe: Option<usize> = None;
        for trial in 0..trials {
            if schedule.next_flag(&mut rng) {
                if let Some(prev) = last_probe {
                    prop_assert!(trial - prev >= noprobe_span + 1);
                }
                last_probe = Some(trial);
            }
        }
    }

    #[test]
    fn gate_never_accepts_an_infeasible_target(
        nback in 1u8..=2,
        history_len in 0usize..10,
        trial_number in 1usize..400,
        trials_per_block in 1usize..400,
        rate in 0.0f64..1.0,
    ) {
        let outcome = evaluate_target(true, history_len, nback, trial_number, trials_per_block, rate);
        if history_len < nback as usize {
            prop_assert_ne!(outcome, TargetOutcome::Accepted);
            // Downgrade starts exactly at the cutoff, recycle below it.
            let cutoff = (1.0 - rate) * trials_per_block as f64;
            if (trial_number as f64) < cutoff {
                prop_assert_eq!(outcome, TargetOutcome::Recycled);
            } else {
                prop_assert_eq!(outcome, TargetOutcome::Downgraded);
            }
        } else {
            prop_assert_eq!(outcome, TargetOutcome::Accepted);
        }
    }

    #[test]
    fn non_targets_always_pass_the_gate(
        history_len in 0usize..10,
        trial_number in 1usize..400,
        trials_per_block in 1usize..400,
        rate in 0.0f64..1.0,
    ) {
        for nback in [1u8, 2] {
            let outcome =
                evaluate_target(false, history_len, nback, trial_number, trials_per_block, rate);
            prop_assert_eq!(outcome, TargetOutcome::Accepted);
        }
    }

    #[test]
    fn recycling_preserves_the_pool_population(
        trials in 1usize..200,
        target_weight in 1u32..5,
        nontarget_weight in 1u32..8,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pool = TargetPool::sample(trials, (target_weight, nontarget_weight), &mut rng);
        prop_assert_eq!(pool.len(), trials);
        let targets_before = pool.target_count();

        if let Some(flag) = pool.draw() {
            pool.recycle(flag, &mut rng);
            prop_assert_eq!(pool.len(), trials);
            prop_assert_eq!(pool.target_count(), targets_before);
        }
    }
}
