/// Trial state machine events
#[derive(Debug, Clone, PartialEq)]
pub enum TrialState {
    /// Glyph visible, response window open
    Stimulus,
    /// Mask visible until trial end, response window still open
    Mask,
    /// Practice-only accuracy feedback
    Feedback,
    /// Thought probe on screen, task paused
    Probe,
    /// Waiting for a key press to resume after a probe
    Resume,
    Complete,
}
