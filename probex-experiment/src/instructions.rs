use probex_core::{SIZES_DEG, TaskStimulus};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::config::{ExperimentConfig, TaskKind};

/// What a page asks the collaborator to present alongside its text.
#[derive(Debug, Clone, PartialEq)]
pub enum PageDemo {
    /// A short run of example stimuli at random sizes.
    StimulusSequence { count: usize },
    /// One practice run of the session's thought probe.
    ExampleProbe,
}

/// One instruction page. The collaborator presents the text (and demo, if
/// any) and reports a key press to advance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionPage {
    pub text: String,
    pub demo: Option<PageDemo>,
}

fn task_explanation(task: &TaskKind) -> String {
    match task {
        TaskKind::Sart { target_digit } => format!(
            "Your task will be to press the [space] key as quickly as possible whenever a \
             number other than {0} appears, and to withhold your response whenever the number \
             is {0}.\n\nPress any key to continue.",
            target_digit
        ),
        TaskKind::NBack { .. } => String::from(
            "Your task will be to press the [space] key as quickly as possible whenever the \
             letter on screen matches the one shown a given number of letters earlier, and to \
             withhold your response otherwise. The number of letters to look back changes \
             between blocks and is announced before each block.\n\nPress any key to continue.",
        ),
    }
}

/// The instruction sequence shown before practice, in presentation order.
pub fn pages(config: &ExperimentConfig) -> Vec<InstructionPage> {
    let stimulus_noun = match config.task {
        TaskKind::Sart { .. } => "numbers",
        TaskKind::NBack { .. } => "letters",
    };
    vec![
        InstructionPage {
            text: format!(
                "During this task, you will be presented with a sequence of {} in the middle \
                 of the screen.\n\nPress any key to see an example.",
                stimulus_noun
            ),
            demo: Some(PageDemo::StimulusSequence { count: 4 }),
        },
        InstructionPage {
            text: task_explanation(&config.task),
            demo: None,
        },
        InstructionPage {
            text: String::from(
                "Occasionally, the task will be interrupted by screens asking you about your \
                 focus just prior.\nWhen this happens, please select the most accurate \
                 response using the mouse cursor.\n\nPress any key to see an example.",
            ),
            demo: Some(PageDemo::ExampleProbe),
        },
    ]
}

/// Stimuli for the instruction demo: distinct glyphs, random sizes.
pub fn demo_stimuli<R: Rng + ?Sized>(
    config: &ExperimentConfig,
    count: usize,
    rng: &mut R,
) -> Vec<TaskStimulus> {
    let mut glyphs = config.stimulus_set.clone();
    glyphs.shuffle(rng);
    glyphs.truncate(count);
    glyphs
        .into_iter()
        .map(|g| {
            let size = SIZES_DEG.choose(rng).copied().unwrap_or(SIZES_DEG[0]);
            TaskStimulus::new(g, size)
        })
        .collect()
}

/// Message shown at the top of a gated block, before the start key.
pub fn block_message(config: &ExperimentConfig, nback: u8, practicing: bool) -> String {
    let mut text = match &config.task {
        TaskKind::Sart { target_digit } => format!(
            "Please press the space key quickly when a digit other than {0} \nappears on \
             screen, and withhold your response when the digit is {0}.",
            target_digit
        ),
        TaskKind::NBack { .. } => format!(
            "Please press the space key quickly when the letter on screen matches the one \
             shown {0} letters earlier, and withhold your response otherwise.",
            nback
        ),
    };
    if practicing {
        text = format!(
            "This is a practice block.\n\n{}\nYou will be given feedback on your accuracy.",
            text
        );
    }
    text
}

/// Practice feedback line for one completed trial.
pub fn feedback_text(config: &ExperimentConfig, accuracy: bool, correct_label: &str) -> String {
    if accuracy {
        return String::from("Correct response!");
    }
    let advice = match (&config.task, correct_label) {
        (TaskKind::Sart { target_digit }, "nogo") => format!(
            "Please withhold responses to the digit {}.",
            target_digit
        ),
        (TaskKind::Sart { target_digit }, _) => format!(
            "Please respond quickly to digits other than {}.",
            target_digit
        ),
        (TaskKind::NBack { .. }, "nogo") => {
            String::from("Please withhold responses when the letter is not a match.")
        }
        (TaskKind::NBack { .. }, _) => {
            String::from("Please respond quickly when the letter is a match.")
        }
    };
    format!("Incorrect! {}", advice)
}

/// Prompt shown while the session waits for the start key.
pub const START_PROMPT: &str = "Press the [space] key to start.";

/// Prompt shown after a probe, before the task resumes.
pub const RESUME_PROMPT: &str = "Press the [space] key to continue.";
