pub mod phase;
pub mod probe;
pub mod record;
pub mod stimulus;
pub mod trial;

pub use phase::{Phase, SessionPhase};
pub use probe::{ProbeChoice, ProbeKind, ProbeScale};
pub use record::TrialRecord;
pub use stimulus::{NBACK_LETTERS, SART_DIGITS, SIZES_DEG, Stimulus, TaskStimulus};
pub use trial::TrialState;
