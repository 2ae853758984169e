use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use probex_core::{SessionPhase, TrialRecord, TrialState};
use probex_experiment::{
    ExperimentConfig, ResultSink, SessionEvent, SessionState, TaskKind,
};
use probex_timing::{ManualTimer, Timer};
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use tracing::{info, warn};

type Session = SessionState<SessionPhase, ManualTimer, ThreadRng>;

/// Simulation step. Small enough that stimulus and mask onsets land
/// within a millisecond of their nominal times.
const TICK: Duration = Duration::from_millis(5);

const MAX_TICKS: u64 = 50_000_000;

/// Writes each completed trial as one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn write(&mut self, record: &TrialRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")
    }
}

/// One planned response for the trial currently on screen.
struct ResponsePlan {
    trial_id: usize,
    respond: bool,
    latency_ms: f64,
    planned_at: u64,
    sent: bool,
}

/// Scripted participant: presses the start key when asked, responds to
/// stimuli with plausible latencies, and answers probes after a beat.
struct SimulatedParticipant {
    rng: ThreadRng,
    plan: Option<ResponsePlan>,
}

impl SimulatedParticipant {
    fn new() -> Self {
        Self {
            rng: rand::rng(),
            plan: None,
        }
    }

    fn act(&mut self, session: &mut Session, timer: &ManualTimer) {
        if session.is_finished() {
            return;
        }

        if let Some(probe) = session.current_probe() {
            // Linger on the probe a little before picking an answer.
            if self.rng.random_bool(0.1) {
                let labels = probe.response_labels();
                let label = labels
                    .choose(&mut self.rng)
                    .cloned()
                    .unwrap_or_default();
                session.handle_event(SessionEvent::ProbeAnswered { label });
            }
            return;
        }

        if session.current_trial_state() == Some(&TrialState::Resume) {
            session.handle_event(SessionEvent::SpacePressed);
            return;
        }

        if session.is_awaiting_input() {
            session.handle_event(SessionEvent::SpacePressed);
            return;
        }

        let Some(id) = session.current_trial_id() else {
            return;
        };
        if self.plan.as_ref().map(|p| p.trial_id) != Some(id) {
            let go_prob = match (&session.config.task, session.current_stimulus()) {
                (TaskKind::Sart { target_digit }, Some(stim)) => {
                    // Mostly correct, with occasional commission errors.
                    if stim.glyph == *target_digit { 0.2 } else { 0.95 }
                }
                _ => 0.5,
            };
            self.plan = Some(ResponsePlan {
                trial_id: id,
                respond: self.rng.random_bool(go_prob),
                latency_ms: self.rng.random_range(250.0..900.0),
                planned_at: timer.now(),
                sent: false,
            });
        }
        if let Some(plan) = self.plan.as_mut() {
            if plan.respond
                && !plan.sent
                && timer.elapsed(plan.planned_at).as_secs_f64() * 1e3 >= plan.latency_ms
            {
                plan.sent = true;
                session.handle_event(SessionEvent::ResponseReceived);
            }
        }
    }
}

/// Running tallies reported at the end of the session.
#[derive(Default)]
struct SessionSummary {
    trials: usize,
    correct: usize,
    probes: usize,
    go_rt_sum_ms: f64,
    go_responses: usize,
}

impl SessionSummary {
    fn add(&mut self, record: &TrialRecord) {
        self.trials += 1;
        if record.accuracy {
            self.correct += 1;
        }
        if record.probe_resp.is_some() {
            self.probes += 1;
        }
        if let Some(rt) = record.rt_ms {
            self.go_rt_sum_ms += rt;
            self.go_responses += 1;
        }
    }
}

/// Headless session runner: drives the scheduler against simulated time
/// and a scripted participant, streaming records to the sink.
pub struct App {
    session: Session,
    timer: ManualTimer,
    participant: SimulatedParticipant,
    sink: JsonLinesSink<io::Stdout>,
    summary: SessionSummary,
}

impl App {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        let timer = ManualTimer::new();
        let session = SessionState::new(config, timer.clone(), rand::rng())?;

        Ok(Self {
            session,
            timer,
            participant: SimulatedParticipant::new(),
            sink: JsonLinesSink::new(io::stdout()),
            summary: SessionSummary::default(),
        })
    }

    pub fn run(mut self) -> Result<()> {
        info!(task = ?self.session.config.task, "session starting");
        info!(
            blocks = self.session.config.blocks_per_experiment,
            trials_per_block = self.session.config.trials_per_block,
            probe = ?self.session.config.probe_condition,
            "configuration"
        );

        let mut ticks: u64 = 0;
        while !self.session.is_finished() {
            self.timer.advance(TICK);
            let events = self.session.update();
            for event in events {
                self.session.handle_event(event);
            }
            self.participant.act(&mut self.session, &self.timer);

            for record in self.session.drain_results() {
                self.summary.add(&record);
                self.sink.write(&record)?;
            }

            ticks += 1;
            if ticks > MAX_TICKS {
                warn!("simulation tick limit reached before debrief");
                anyhow::bail!("session did not finish within {} ticks", MAX_TICKS);
            }
        }

        let mean_rt = if self.summary.go_responses > 0 {
            self.summary.go_rt_sum_ms / self.summary.go_responses as f64
        } else {
            0.0
        };
        info!(
            trials = self.summary.trials,
            accuracy_pct =
                100.0 * self.summary.correct as f64 / self.summary.trials.max(1) as f64,
            probes = self.summary.probes,
            mean_go_rt_ms = mean_rt,
            "session complete"
        );
        Ok(())
    }
}
