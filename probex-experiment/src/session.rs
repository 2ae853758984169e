use std::collections::VecDeque;
use std::time::Duration;

use probex_core::{Phase, ProbeKind, SIZES_DEG, Stimulus, TaskStimulus, TrialRecord, TrialState};
use probex_timing::{CountDown, Timer};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::block::{BlockContext, cycled_shuffled};
use crate::config::{ExperimentConfig, TaskKind};
use crate::error::ConfigError;
use crate::instructions::{self, InstructionPage};
use crate::schedule::ProbeSchedule;
use crate::targets::{TargetOutcome, TargetPool, evaluate_target, target_rate};
use crate::trial::{Response, Trial, TrialOnsets};

/// Label recorded for a key press inside the response window.
pub const RESPONSE_GO: &str = "go";
/// Label recorded for a withheld (or timed-out) response.
pub const RESPONSE_NOGO: &str = "nogo";

/// Events exchanged with the collaborator loop
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// UI advancement key: welcome, instructions, block start, probe resume
    SpacePressed,
    /// Task response key press inside the response window
    ResponseReceived,
    /// Probe answer selected in the collaborator's probe UI
    ProbeAnswered { label: String },
    TrialComplete,
    BlockComplete,
    PhaseComplete,
}

/// Collaborator-side persistence seam: receives each completed trial.
/// Actual file or database writing lives entirely behind this trait.
pub trait ResultSink {
    fn write(&mut self, record: &TrialRecord) -> std::io::Result<()>;
}

/// Event-driven session scheduler.
///
/// The collaborator loop alternates `update()` (timer-driven transitions,
/// returned as events) with `handle_event()` (input and lifecycle events).
/// Single-threaded; all per-block state lives in the owned [`BlockContext`].
pub struct SessionState<P, T, R>
where
    P: Phase,
    T: Timer,
    R: Rng,
{
    pub phase: P,
    pub timer: T,
    pub rng: R,
    pub config: ExperimentConfig,

    probes: ProbeSchedule,
    /// Pre-sampled target pools, one per block, front-first (n-back only).
    pools: VecDeque<TargetPool>,
    /// Target fraction of the full pre-sampled population, fixed at setup.
    nback_rate: f64,

    instructions: Vec<InstructionPage>,
    instruction_page: usize,

    block: Option<BlockContext>,
    current: Option<Trial<T::Timestamp>>,
    block_number: usize,
    phase_block_number: usize,
    trial_counter: usize,

    awaiting_input: bool,
    block_gate: Option<CountDown<T>>,
    feedback_hold: Option<CountDown<T>>,

    results: Vec<TrialRecord>,
}

impl<P, T, R> SessionState<P, T, R>
where
    P: Phase,
    T: Timer,
    R: Rng,
{
    pub fn new(config: ExperimentConfig, timer: T, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let probes = ProbeSchedule::generate(
            config.probe_span,
            config.noprobe_span,
            config.total_experiment_trials(),
            &mut rng,
        );

        // Pre-sample every block's target flags up front so the session
        // target rate is known before the first draw.
        let mut pools = VecDeque::new();
        if matches!(config.task, TaskKind::NBack { .. }) {
            let practice = if config.run_practice_blocks {
                config.practice_blocks
            } else {
                0
            };
            for _ in 0..practice {
                pools.push_back(TargetPool::sample(
                    config.practice_trial_count,
                    config.target_weight,
                    &mut rng,
                ));
            }
            for _ in 0..config.blocks_per_experiment {
                pools.push_back(TargetPool::sample(
                    config.trials_per_block,
                    config.target_weight,
                    &mut rng,
                ));
            }
        }
        let nback_rate = target_rate(pools.make_contiguous());

        let instructions = instructions::pages(&config);

        Ok(Self {
            phase: P::default(),
            timer,
            rng,
            config,
            probes,
            pools,
            nback_rate,
            instructions,
            instruction_page: 0,
            block: None,
            current: None,
            block_number: 0,
            phase_block_number: 0,
            trial_counter: 0,
            awaiting_input: true,
            block_gate: None,
            feedback_hold: None,
            results: Vec::new(),
        })
    }

    fn first_nonpractice(&self) -> usize {
        if self.config.run_practice_blocks {
            self.config.practice_blocks + 1
        } else {
            1
        }
    }

    fn blocks_in_phase(&self) -> usize {
        if self.phase.is_practice() {
            self.config.practice_blocks
        } else if self.phase.is_experiment() {
            self.config.blocks_per_experiment
        } else {
            0
        }
    }

    fn advance_phase(&mut self) -> bool {
        if let Some(next) = self.phase.next() {
            self.phase = next;
            self.phase_block_number = 0;
            self.awaiting_input = self.phase.is_welcome() || self.phase.is_instructions();
            info!(phase = ?self.phase, "phase advanced");

            if self.phase.is_practice()
                && (!self.config.run_practice_blocks || self.config.practice_blocks == 0)
            {
                return self.advance_phase();
            }
            if self.phase.is_practice() || self.phase.is_experiment() {
                self.start_block();
            }
            true
        } else {
            false
        }
    }

    fn start_block(&mut self) {
        self.block_number += 1;
        self.phase_block_number += 1;
        let practicing = self.phase.is_practice();
        let trials = if practicing {
            self.config.practice_trial_count
        } else {
            self.config.trials_per_block
        };
        let nback = self.config.nback_level(self.phase_block_number);

        let sizes = cycled_shuffled(&SIZES_DEG, trials, &mut self.rng);
        let glyphs = match self.config.task {
            TaskKind::Sart { .. } => Some(cycled_shuffled(
                &self.config.stimulus_set,
                trials,
                &mut self.rng,
            )),
            TaskKind::NBack { .. } => None,
        };
        let targets = if matches!(self.config.task, TaskKind::NBack { .. }) {
            let pool = match self.pools.pop_front() {
                Some(pool) => pool,
                None => TargetPool::sample(trials, self.config.target_weight, &mut self.rng),
            };
            Some(pool)
        } else {
            None
        };

        self.block = Some(BlockContext {
            block_num: self.block_number,
            practicing,
            trials,
            trials_done: 0,
            nback,
            sizes,
            glyphs,
            targets,
            history: Vec::new(),
        });
        info!(
            block = self.block_number,
            practicing, nback, "block started"
        );

        // The first practice block and the first non-practice block hold
        // the block message, then wait for the start key.
        let gated = self.block_number == 1 || self.block_number == self.first_nonpractice();
        if gated {
            self.awaiting_input = true;
            self.block_gate = Some(CountDown::new(
                self.timer.clone(),
                Duration::from_millis(self.config.block_message_ms),
            ));
        } else {
            self.awaiting_input = false;
            self.block_gate = None;
            self.start_trial();
        }
    }

    fn start_trial(&mut self) {
        let Some(block) = self.block.as_mut() else {
            return;
        };
        let trial_num = block.trials_done + 1;
        let size = block.sizes.pop().unwrap_or(SIZES_DEG[2]);
        let probe_trial = !block.practicing && self.probes.next_flag(&mut self.rng);

        let (glyph, is_target) = match self.config.task {
            TaskKind::Sart { .. } => {
                let glyph = block
                    .glyphs
                    .as_mut()
                    .and_then(Vec::pop)
                    .or_else(|| self.config.stimulus_set.first().copied())
                    .unwrap_or('?');
                (glyph, None)
            }
            TaskKind::NBack { .. } => {
                let nback = block.nback;
                let is_target = loop {
                    let Some(pool) = block.targets.as_mut() else {
                        break false;
                    };
                    let flag = pool.draw().unwrap_or(false);
                    let can_recycle = pool.has_nontarget();
                    match evaluate_target(
                        flag,
                        block.history.len(),
                        nback,
                        trial_num,
                        block.trials,
                        self.nback_rate,
                    ) {
                        TargetOutcome::Accepted => break flag,
                        TargetOutcome::Downgraded => {
                            debug!(trial_num, "infeasible target downgraded");
                            break false;
                        }
                        TargetOutcome::Recycled if can_recycle => {
                            debug!(trial_num, "infeasible target recycled");
                            pool.recycle(flag, &mut self.rng);
                        }
                        TargetOutcome::Recycled => {
                            // Only targets left to draw: recycling cannot
                            // terminate, so force this slot to non-target.
                            debug!(trial_num, "recycle impossible, downgrading");
                            break false;
                        }
                    }
                };
                let matched = block.nback_match(nback);
                let glyph = if is_target {
                    matched
                        .or_else(|| self.config.stimulus_set.first().copied())
                        .unwrap_or('?')
                } else {
                    loop {
                        let g = self
                            .config
                            .stimulus_set
                            .choose(&mut self.rng)
                            .copied()
                            .unwrap_or('?');
                        // Avoid an unintended n-back match.
                        if self.config.stimulus_set.len() == 1 || Some(g) != matched {
                            break g;
                        }
                    }
                };
                (glyph, Some(is_target))
            }
        };

        self.trial_counter += 1;
        let now = self.timer.now();
        debug!(
            id = self.trial_counter,
            trial_num,
            glyph = %glyph,
            probe_trial,
            "trial started"
        );
        self.current = Some(Trial {
            id: self.trial_counter,
            trial_num,
            stimulus: TaskStimulus::new(glyph, size),
            is_target,
            probe_trial,
            onsets: TrialOnsets {
                mask_on_ms: self.config.stim_duration_ms,
                trial_end_ms: self.config.trial_duration_ms,
            },
            start: now,
            pressed_at_ms: None,
            response: None,
            accuracy: None,
            probe_onset: None,
            probe_response: None,
            state: TrialState::Stimulus,
        });
    }

    /// Timer-driven transitions, returned as events for the caller to feed
    /// back through `handle_event`.
    pub fn update(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !(self.phase.is_practice() || self.phase.is_experiment()) {
            return events;
        }

        self.update_trial(&mut events);

        if self.current.is_none() && !self.awaiting_input {
            if let Some(block) = &self.block {
                if block.trials_done >= block.trials {
                    if self.phase_block_number >= self.blocks_in_phase() {
                        events.push(SessionEvent::PhaseComplete);
                    } else {
                        events.push(SessionEvent::BlockComplete);
                    }
                } else if block.trials_done > 0 {
                    // Between trials: run straight into the next one.
                    self.start_trial();
                }
            }
        }
        events
    }

    fn update_trial(&mut self, events: &mut Vec<SessionEvent>) {
        if self.awaiting_input {
            return;
        }
        let (state, elapsed_ms, onsets) = match &self.current {
            Some(t) => (t.state.clone(), self.elapsed_ms(t.start), t.onsets.clone()),
            None => return,
        };
        match state {
            TrialState::Stimulus => {
                if elapsed_ms >= onsets.mask_on_ms as f64 {
                    if let Some(t) = self.current.as_mut() {
                        t.state = TrialState::Mask;
                    }
                }
            }
            TrialState::Mask => {
                if elapsed_ms >= onsets.trial_end_ms as f64 {
                    self.resolve_response();
                    self.after_response_window(events);
                }
            }
            TrialState::Feedback => {
                if self.feedback_hold.as_ref().is_some_and(|cd| !cd.counting()) {
                    self.feedback_hold = None;
                    if let Some(t) = self.current.as_mut() {
                        t.state = TrialState::Complete;
                    }
                    events.push(SessionEvent::TrialComplete);
                }
            }
            TrialState::Probe | TrialState::Resume | TrialState::Complete => {}
        }
    }

    /// Resolve the trial's response and accuracy at the end of the
    /// response window.
    fn resolve_response(&mut self) {
        let Some(correct) = self.correct_label() else {
            return;
        };
        if let Some(t) = self.current.as_mut() {
            let (label, rt_ms) = match t.pressed_at_ms {
                Some(rt) => (RESPONSE_GO, Some(rt)),
                None => (RESPONSE_NOGO, None),
            };
            t.accuracy = Some(label == correct);
            t.response = Some(Response {
                label: label.to_string(),
                rt_ms,
            });
        }
    }

    fn after_response_window(&mut self, events: &mut Vec<SessionEvent>) {
        let practicing = self.phase.is_practice();
        let probe_trial = self.current.as_ref().is_some_and(|t| t.probe_trial);
        if practicing {
            if let Some(t) = self.current.as_mut() {
                t.state = TrialState::Feedback;
            }
            self.feedback_hold = Some(CountDown::new(
                self.timer.clone(),
                Duration::from_millis(self.config.feedback_duration_ms),
            ));
        } else if probe_trial {
            let now = self.timer.now();
            if let Some(t) = self.current.as_mut() {
                t.state = TrialState::Probe;
                t.probe_onset = Some(now);
            }
            debug!("thought probe onscreen");
        } else {
            if let Some(t) = self.current.as_mut() {
                t.state = TrialState::Complete;
            }
            events.push(SessionEvent::TrialComplete);
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::SpacePressed => self.handle_space(),
            SessionEvent::ResponseReceived => {
                if self.phase.allows_input() {
                    self.record_response()
                } else {
                    false
                }
            }
            SessionEvent::ProbeAnswered { label } => self.answer_probe(label),
            SessionEvent::TrialComplete => {
                self.complete_current_trial();
                true
            }
            SessionEvent::BlockComplete => {
                self.start_block();
                true
            }
            SessionEvent::PhaseComplete => self.advance_phase(),
        }
    }

    fn handle_space(&mut self) -> bool {
        if self.phase.is_welcome() {
            return self.advance_phase();
        }
        if self.phase.is_instructions() {
            self.instruction_page += 1;
            if self.instruction_page >= self.instructions.len() {
                return self.advance_phase();
            }
            return true;
        }
        if self.phase.is_practice() || self.phase.is_experiment() {
            if self.awaiting_input {
                // The start key only counts once the block message has
                // been up for its full hold.
                if self.block_gate.as_ref().is_some_and(|cd| cd.counting()) {
                    return false;
                }
                self.block_gate = None;
                self.awaiting_input = false;
                self.start_trial();
                return true;
            }
            if self
                .current
                .as_ref()
                .is_some_and(|t| t.state == TrialState::Resume)
            {
                self.complete_current_trial();
                return true;
            }
        }
        false
    }

    /// Records a task response during the response window. Only the first
    /// press counts.
    fn record_response(&mut self) -> bool {
        let rt_ms = match &self.current {
            Some(t)
                if matches!(t.state, TrialState::Stimulus | TrialState::Mask)
                    && t.pressed_at_ms.is_none() =>
            {
                self.elapsed_ms(t.start)
            }
            _ => return false,
        };
        if let Some(t) = self.current.as_mut() {
            t.pressed_at_ms = Some(rt_ms);
        }
        debug!(rt_ms, "response recorded");
        true
    }

    fn answer_probe(&mut self, label: String) -> bool {
        let onset = match &self.current {
            Some(t) if t.state == TrialState::Probe => t.probe_onset,
            _ => return false,
        };
        if !self
            .config
            .probe_condition
            .response_labels()
            .iter()
            .any(|l| l == &label)
        {
            warn!(label = %label, "probe response label not in the probe's option set");
        }
        let rt_ms = onset.map(|ts| self.elapsed_ms(ts));
        if let Some(t) = self.current.as_mut() {
            t.probe_response = Some(Response { label, rt_ms });
            t.state = TrialState::Resume;
        }
        debug!("probe answered, waiting for resume key");
        true
    }

    /// Completes the current trial and stores its record
    fn complete_current_trial(&mut self) {
        if self.current.as_ref().is_some_and(|t| t.response.is_none()) {
            self.resolve_response();
        }
        let Some(trial) = self.current.take() else {
            return;
        };
        let Some(block) = self.block.as_mut() else {
            return;
        };
        let response = trial.response.clone().unwrap_or(Response {
            label: RESPONSE_NOGO.to_string(),
            rt_ms: None,
        });
        let (target, is_target, nback) = match &self.config.task {
            TaskKind::Sart { target_digit } => (Some(target_digit.to_string()), None, None),
            TaskKind::NBack { .. } => (None, trial.is_target, Some(block.nback)),
        };
        let record = TrialRecord {
            block_num: block.block_num,
            trial_num: trial.trial_num,
            practicing: block.practicing,
            stimulus: trial.stimulus.label(),
            target,
            is_target,
            nback,
            response: response.label,
            rt_ms: response.rt_ms,
            accuracy: trial.accuracy.unwrap_or(false),
            probe_resp: trial.probe_response.as_ref().map(|r| r.label.clone()),
            probe_rt_ms: trial.probe_response.as_ref().and_then(|r| r.rt_ms),
        };
        debug!(
            block = record.block_num,
            trial = record.trial_num,
            accuracy = record.accuracy,
            "trial complete"
        );
        self.results.push(record);

        block.trials_done += 1;
        if matches!(self.config.task, TaskKind::NBack { .. }) {
            block.record_presented(trial.probe_trial, trial.stimulus.glyph);
        }
        self.feedback_hold = None;
    }

    /// Correct response label for the trial currently on screen.
    fn correct_label(&self) -> Option<&'static str> {
        let trial = self.current.as_ref()?;
        Some(match &self.config.task {
            TaskKind::Sart { target_digit } => {
                if trial.stimulus.glyph == *target_digit {
                    RESPONSE_NOGO
                } else {
                    RESPONSE_GO
                }
            }
            TaskKind::NBack { .. } => {
                if trial.is_target == Some(true) {
                    RESPONSE_GO
                } else {
                    RESPONSE_NOGO
                }
            }
        })
    }

    // --- collaborator accessors ---

    pub fn current_phase(&self) -> &P {
        &self.phase
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.awaiting_input || self.phase.is_welcome() || self.phase.is_instructions()
    }

    /// True once the whole session has run to completion.
    pub fn is_finished(&self) -> bool {
        self.phase.next().is_none()
    }

    pub fn current_trial_state(&self) -> Option<&TrialState> {
        self.current.as_ref().map(|t| &t.state)
    }

    /// Session-wide index of the trial on screen, if any.
    pub fn current_trial_id(&self) -> Option<usize> {
        self.current.as_ref().map(|t| t.id)
    }

    pub fn current_stimulus(&self) -> Option<&TaskStimulus> {
        self.current
            .as_ref()
            .filter(|t| t.state == TrialState::Stimulus)
            .map(|t| &t.stimulus)
    }

    pub fn should_show_mask(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| t.state == TrialState::Mask)
    }

    /// The probe to present, while a probe trial waits for its answer.
    pub fn current_probe(&self) -> Option<ProbeKind> {
        self.current
            .as_ref()
            .filter(|t| t.state == TrialState::Probe)
            .map(|_| self.config.probe_condition)
    }

    /// Practice feedback line, while the feedback interval runs.
    pub fn feedback_text(&self) -> Option<String> {
        let trial = self.current.as_ref()?;
        if trial.state != TrialState::Feedback {
            return None;
        }
        let correct = self.correct_label()?;
        Some(instructions::feedback_text(
            &self.config,
            trial.accuracy.unwrap_or(false),
            correct,
        ))
    }

    /// The instruction page currently awaiting its key press.
    pub fn current_instruction(&self) -> Option<&InstructionPage> {
        if self.phase.is_instructions() {
            self.instructions.get(self.instruction_page)
        } else {
            None
        }
    }

    /// Block message shown behind the start gate.
    pub fn block_message(&self) -> Option<String> {
        let block = self.block.as_ref()?;
        if self.awaiting_input {
            Some(instructions::block_message(
                &self.config,
                block.nback,
                block.practicing,
            ))
        } else {
            None
        }
    }

    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        self.block
            .as_ref()
            .map(|b| (b.trials_done.min(b.trials.saturating_sub(1)) + 1, b.trials))
    }

    pub fn nback_rate(&self) -> f64 {
        self.nback_rate
    }

    pub fn results(&self) -> &[TrialRecord] {
        &self.results
    }

    /// Hand accumulated records to the persistence collaborator.
    pub fn drain_results(&mut self) -> Vec<TrialRecord> {
        std::mem::take(&mut self.results)
    }

    fn elapsed_ms(&self, ts: T::Timestamp) -> f64 {
        self.timer.elapsed(ts).as_secs_f64() * 1e3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probex_core::SessionPhase;
    use probex_timing::ManualTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    type TestSession = SessionState<SessionPhase, ManualTimer, StdRng>;

    fn session_with(config: ExperimentConfig, seed: u64) -> (TestSession, ManualTimer) {
        let timer = ManualTimer::new();
        let session =
            SessionState::new(config, timer.clone(), StdRng::seed_from_u64(seed)).unwrap();
        (session, timer)
    }

    fn quick_sart() -> ExperimentConfig {
        ExperimentConfig {
            trials_per_block: 4,
            blocks_per_experiment: 2,
            run_practice_blocks: false,
            practice_blocks: 0,
            stim_duration_ms: 5,
            trial_duration_ms: 10,
            feedback_duration_ms: 5,
            block_message_ms: 2,
            probe_span: 2,
            noprobe_span: 1,
            ..ExperimentConfig::default()
        }
    }

    fn pump(session: &mut TestSession) {
        let events = session.update();
        for event in events {
            session.handle_event(event);
        }
    }

    /// Advance simulated time 1 ms per step, pressing keys whenever the
    /// session waits for one and answering probes as they appear.
    fn drive(session: &mut TestSession, timer: &ManualTimer, max_steps: u64, probe_label: &str) {
        for _ in 0..max_steps {
            if session.is_finished() {
                return;
            }
            if session.current_probe().is_some() {
                session.handle_event(SessionEvent::ProbeAnswered {
                    label: probe_label.to_string(),
                });
                session.handle_event(SessionEvent::SpacePressed);
                continue;
            }
            if session.is_awaiting_input() {
                session.handle_event(SessionEvent::SpacePressed);
            }
            timer.advance(Duration::from_millis(1));
            pump(session);
        }
        panic!("session did not finish within {max_steps} steps");
    }

    #[test]
    fn full_sart_session_records_every_trial() {
        let (mut session, timer) = session_with(quick_sart(), 1);
        drive(&mut session, &timer, 5_000, "relevant");

        assert!(session.is_finished());
        let records = session.results();
        assert_eq!(records.len(), 8);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.block_num, i / 4 + 1);
            assert_eq!(record.trial_num, i % 4 + 1);
            assert!(!record.practicing);
            // No responses were sent: every trial times out as a no-go.
            assert_eq!(record.response, RESPONSE_NOGO);
            assert_eq!(record.rt_ms, None);
            assert_eq!(record.accuracy, record.stimulus == "3");
            assert_eq!(record.target.as_deref(), Some("3"));
            assert_eq!(record.probe_resp.is_some(), record.probe_rt_ms.is_some());
        }
        // probe_span=2, noprobe_span=1 over 8 trials: at least one probe.
        assert!(records.iter().any(|r| r.probe_resp.is_some()));
    }

    #[test]
    fn key_press_inside_the_window_records_a_go_with_rt() {
        let (mut session, timer) = session_with(quick_sart(), 2);
        // Welcome, then three instruction pages.
        for _ in 0..4 {
            session.handle_event(SessionEvent::SpacePressed);
        }
        assert!(session.current_phase().is_experiment());

        // Block gate: the start key is ignored during the message hold.
        assert!(session.is_awaiting_input());
        session.handle_event(SessionEvent::SpacePressed);
        assert!(session.is_awaiting_input());
        assert!(session.block_message().is_some());

        timer.advance(Duration::from_millis(2));
        pump(&mut session);
        session.handle_event(SessionEvent::SpacePressed);
        assert_eq!(
            session.current_trial_state(),
            Some(&TrialState::Stimulus)
        );

        for _ in 0..3 {
            timer.advance(Duration::from_millis(1));
            pump(&mut session);
        }
        assert!(session.handle_event(SessionEvent::ResponseReceived));
        // A second press within the same trial is ignored.
        assert!(!session.handle_event(SessionEvent::ResponseReceived));

        drive(&mut session, &timer, 5_000, "relevant");
        let first = &session.results()[0];
        assert_eq!(first.response, RESPONSE_GO);
        let rt = first.rt_ms.expect("go response carries a reaction time");
        assert!((rt - 3.0).abs() < 1e-6);
        assert_eq!(first.accuracy, first.stimulus != "3");
    }

    #[test]
    fn practice_blocks_give_feedback_and_skip_probes() {
        let config = ExperimentConfig {
            run_practice_blocks: true,
            practice_blocks: 1,
            practice_trial_count: 2,
            trials_per_block: 2,
            blocks_per_experiment: 1,
            ..quick_sart()
        };
        let (mut session, timer) = session_with(config, 3);

        let mut saw_feedback = false;
        for _ in 0..5_000u64 {
            if session.is_finished() {
                break;
            }
            if session.feedback_text().is_some() {
                saw_feedback = true;
            }
            if session.current_probe().is_some() {
                session.handle_event(SessionEvent::ProbeAnswered {
                    label: "relevant".to_string(),
                });
                session.handle_event(SessionEvent::SpacePressed);
                continue;
            }
            if session.is_awaiting_input() {
                session.handle_event(SessionEvent::SpacePressed);
            }
            timer.advance(Duration::from_millis(1));
            pump(&mut session);
        }

        assert!(session.is_finished());
        assert!(saw_feedback, "practice trials must show feedback");
        let records = session.results();
        assert_eq!(records.len(), 4);
        let (practice, main): (Vec<_>, Vec<_>) =
            records.iter().partition(|r| r.practicing);
        assert_eq!(practice.len(), 2);
        assert_eq!(main.len(), 2);
        assert!(practice.iter().all(|r| r.probe_resp.is_none()));
        // Practice happens in block 1; the first main block is block 2.
        assert!(main.iter().all(|r| r.block_num == 2));
    }

    #[test]
    fn nback_targets_repeat_the_right_stimulus() {
        let config = ExperimentConfig {
            task: TaskKind::NBack { levels: vec![1, 2] },
            stimulus_set: probex_core::NBACK_LETTERS.to_vec(),
            trials_per_block: 12,
            blocks_per_experiment: 2,
            run_practice_blocks: false,
            practice_blocks: 0,
            stim_duration_ms: 5,
            trial_duration_ms: 10,
            block_message_ms: 2,
            probe_span: 4,
            noprobe_span: 2,
            target_weight: (1, 2),
            ..ExperimentConfig::default()
        };
        let (mut session, timer) = session_with(config, 4);
        drive(&mut session, &timer, 20_000, "irrelevant");

        let records = session.results();
        assert_eq!(records.len(), 24);

        for (block_idx, expected_nback) in [(1usize, 1u8), (2, 2)] {
            let mut history: Vec<&str> = Vec::new();
            for record in records.iter().filter(|r| r.block_num == block_idx) {
                assert_eq!(record.nback, Some(expected_nback));
                let is_target = record.is_target.expect("n-back records carry the flag");
                let lag = expected_nback as usize;
                let matched = history
                    .len()
                    .checked_sub(lag)
                    .and_then(|i| history.get(i))
                    .copied();
                if is_target {
                    assert_eq!(
                        matched.map(str::to_string),
                        Some(record.stimulus.clone()),
                        "target trial must repeat the n-back stimulus"
                    );
                } else if let Some(m) = matched {
                    assert_ne!(
                        m, record.stimulus,
                        "non-target trial must not coincidentally match"
                    );
                }
                // Timed-out responses: accuracy tracks the target flag.
                assert_eq!(record.accuracy, !is_target);
                if record.probe_resp.is_some() {
                    history.clear();
                } else {
                    history.push(&record.stimulus);
                }
            }
        }
    }

    #[test]
    fn nback_never_accepts_a_target_before_history_allows() {
        let config = ExperimentConfig {
            task: TaskKind::NBack { levels: vec![2] },
            stimulus_set: probex_core::NBACK_LETTERS.to_vec(),
            trials_per_block: 10,
            blocks_per_experiment: 2,
            run_practice_blocks: false,
            practice_blocks: 0,
            stim_duration_ms: 5,
            trial_duration_ms: 10,
            block_message_ms: 2,
            probe_span: 4,
            noprobe_span: 2,
            // Heavy target weighting stresses the recycle path.
            target_weight: (1, 1),
            ..ExperimentConfig::default()
        };
        let (mut session, timer) = session_with(config, 5);
        drive(&mut session, &timer, 20_000, "irrelevant");

        for record in session.results() {
            if record.trial_num <= 2 {
                // History cannot reach 2 back yet; the gate must have
                // recycled or downgraded every target draw.
                assert_eq!(record.is_target, Some(false));
            }
        }
    }

    #[test]
    fn drained_results_reach_the_sink_exactly_once() {
        struct CountingSink(usize);
        impl ResultSink for CountingSink {
            fn write(&mut self, _record: &TrialRecord) -> std::io::Result<()> {
                self.0 += 1;
                Ok(())
            }
        }

        let (mut session, timer) = session_with(quick_sart(), 6);
        let mut sink = CountingSink(0);
        for _ in 0..5_000u64 {
            if session.is_finished() {
                break;
            }
            if session.current_probe().is_some() {
                session.handle_event(SessionEvent::ProbeAnswered {
                    label: "relevant".to_string(),
                });
                session.handle_event(SessionEvent::SpacePressed);
                continue;
            }
            if session.is_awaiting_input() {
                session.handle_event(SessionEvent::SpacePressed);
            }
            timer.advance(Duration::from_millis(1));
            pump(&mut session);
            for record in session.drain_results() {
                sink.write(&record).unwrap();
            }
        }
        assert!(session.is_finished());
        assert_eq!(sink.0, 8);
        assert!(session.results().is_empty());
    }
}
