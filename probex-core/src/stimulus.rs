use serde::{Deserialize, Serialize};

/// Stimulus text sizes used by both tasks, in degrees of visual angle.
pub const SIZES_DEG: [f32; 5] = [1.5, 2.0, 2.5, 3.0, 3.5];

/// Digit set for the go/no-go task.
pub const SART_DIGITS: [char; 9] = ['1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Consonant set for the n-back task. Vowels are left out so letter runs
/// do not spell anything pronounceable.
pub const NBACK_LETTERS: [char; 12] = ['B', 'D', 'F', 'G', 'H', 'K', 'M', 'P', 'R', 'S', 'T', 'V'];

/// Defines stimuli as the scheduler and record sink see them
pub trait Stimulus: Clone + Send + Sync + std::fmt::Debug {
    /// Identity label as written to the result record
    fn label(&self) -> String;
    /// Identity comparison ignoring presentation attributes
    fn same_identity(&self, other: &Self) -> bool;
}

/// A single glyph presented centrally at one of the five sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskStimulus {
    pub glyph: char,
    pub size_deg: f32,
}

impl TaskStimulus {
    pub fn new(glyph: char, size_deg: f32) -> Self {
        Self { glyph, size_deg }
    }
}

impl Stimulus for TaskStimulus {
    fn label(&self) -> String {
        self.glyph.to_string()
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.glyph == other.glyph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_size() {
        let a = TaskStimulus::new('7', 1.5);
        let b = TaskStimulus::new('7', 3.5);
        let c = TaskStimulus::new('3', 1.5);
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }
}
