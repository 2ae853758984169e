pub mod block;
pub mod config;
pub mod error;
pub mod instructions;
pub mod schedule;
pub mod session;
pub mod targets;
pub mod trial;

pub use block::{BlockContext, cycled_shuffled};
pub use config::{ExperimentConfig, TaskKind};
pub use error::ConfigError;
pub use instructions::{InstructionPage, PageDemo, demo_stimuli};
pub use schedule::ProbeSchedule;
pub use session::{
    RESPONSE_GO, RESPONSE_NOGO, ResultSink, SessionEvent, SessionState,
};
pub use targets::{TargetOutcome, TargetPool, evaluate_target, target_rate};
pub use trial::{Response, Trial, TrialOnsets};
