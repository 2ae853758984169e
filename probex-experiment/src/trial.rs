use probex_core::{TaskStimulus, TrialState};
use serde::{Deserialize, Serialize};

/// Within-trial event onsets relative to trial start, in milliseconds.
#[derive(Debug, Clone)]
pub struct TrialOnsets {
    pub mask_on_ms: u64,
    pub trial_end_ms: u64,
}

/// A resolved response: the recorded label plus reaction time, which is
/// absent on timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub label: String,
    pub rt_ms: Option<f64>,
}

/// Live state for the trial currently on screen.
#[derive(Debug, Clone)]
pub struct Trial<Ts> {
    /// Session-wide index
    pub id: usize,
    /// 1-based position within the block
    pub trial_num: usize,
    pub stimulus: TaskStimulus,
    /// Settled target flag (n-back task only)
    pub is_target: Option<bool>,
    pub probe_trial: bool,
    pub onsets: TrialOnsets,
    /// Stimulus onset; reaction times are measured from here.
    pub start: Ts,
    /// First key press, in ms from stimulus onset. Later presses ignored.
    pub pressed_at_ms: Option<f64>,
    /// Resolved at trial end from `pressed_at_ms`.
    pub response: Option<Response>,
    pub accuracy: Option<bool>,
    pub probe_onset: Option<Ts>,
    pub probe_response: Option<Response>,
    pub state: TrialState,
}
