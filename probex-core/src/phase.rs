/// Defines session phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_welcome(&self) -> bool {
        false
    }
    fn is_instructions(&self) -> bool {
        false
    }
    fn is_practice(&self) -> bool {
        false
    }
    fn is_experiment(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Welcome,
    Instructions,
    Practice,
    Experiment,
    Debrief,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Welcome
    }
}

impl Phase for SessionPhase {
    fn allows_input(&self) -> bool {
        !matches!(self, Self::Debrief)
    }

    fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Welcome => Instructions,
            Instructions => Practice,
            Practice => Experiment,
            Experiment => Debrief,
            Debrief => return None,
        })
    }

    fn is_welcome(&self) -> bool {
        matches!(self, SessionPhase::Welcome)
    }

    fn is_instructions(&self) -> bool {
        matches!(self, SessionPhase::Instructions)
    }

    fn is_practice(&self) -> bool {
        matches!(self, SessionPhase::Practice)
    }

    fn is_experiment(&self) -> bool {
        matches!(self, SessionPhase::Experiment)
    }
}
