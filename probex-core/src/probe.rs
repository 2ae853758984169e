use serde::{Deserialize, Serialize};

/// The five thought-probe styles compared across conditions, each taken
/// from the study whose wording it reproduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeKind {
    /// Likert-type, 1-7, attention-focus wording
    Christoff2009,
    /// 7-AFC, content-focused
    Mcvay2009,
    /// 2-AFC, irrelevant-thought wording
    Mason2007,
    /// 4-AFC, mood-focused
    Killingsworth2010,
    /// Likert-type, 1-5, task-focus wording
    Mrazek2013,
}

/// Response surface of a probe: a rating scale or a fixed choice list.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeScale {
    Likert { first: u8, last: u8 },
    Choice(&'static [ProbeChoice]),
}

/// One selectable probe answer: the label recorded in the data file and
/// the text shown to the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeChoice {
    pub label: &'static str,
    pub text: &'static str,
}

const KILLINGSWORTH_CHOICES: &[ProbeChoice] = &[
    ProbeChoice {
        label: "on_task",
        text: "No",
    },
    ProbeChoice {
        label: "mw_pleasant",
        text: "Yes, something pleasant",
    },
    ProbeChoice {
        label: "mw_neutral",
        text: "Yes, something neutral",
    },
    ProbeChoice {
        label: "mw_unpleasant",
        text: "Yes, something unpleasant",
    },
];

const MASON_CHOICES: &[ProbeChoice] = &[
    ProbeChoice {
        label: "irrelevant",
        text: "Yes",
    },
    ProbeChoice {
        label: "relevant",
        text: "No",
    },
];

const MCVAY_CHOICES: &[ProbeChoice] = &[
    ProbeChoice {
        label: "task",
        text: "The task",
    },
    ProbeChoice {
        label: "performance",
        text: "Task experience/performance",
    },
    ProbeChoice {
        label: "everyday",
        text: "Everyday stuff",
    },
    ProbeChoice {
        label: "currentstate",
        text: "Current state of being",
    },
    ProbeChoice {
        label: "worries",
        text: "Personal worries",
    },
    ProbeChoice {
        label: "daydreams",
        text: "Daydreams",
    },
    ProbeChoice {
        label: "other",
        text: "Other",
    },
];

impl ProbeKind {
    /// Condition letters as assigned in the session parameters.
    pub fn from_condition(condition: char) -> Option<Self> {
        Some(match condition {
            'a' => ProbeKind::Christoff2009,
            'b' => ProbeKind::Mcvay2009,
            'c' => ProbeKind::Mason2007,
            'd' => ProbeKind::Killingsworth2010,
            'e' => ProbeKind::Mrazek2013,
            _ => return None,
        })
    }

    pub fn question(&self) -> &'static str {
        match self {
            ProbeKind::Christoff2009 => {
                "What was your attention focused on just before the probe?\n\
                 1 (on-task) - 7 (off-task)"
            }
            ProbeKind::Mcvay2009 => "What were you just thinking about?",
            ProbeKind::Mason2007 => "Were you just having an irrelevant thought?",
            ProbeKind::Killingsworth2010 => {
                "Are you thinking about something other than\nwhat you're currently doing?"
            }
            ProbeKind::Mrazek2013 => {
                "To what extent was your attention focused on the task\n\
                 or to task-unrelated concerns?"
            }
        }
    }

    pub fn scale(&self) -> ProbeScale {
        match self {
            ProbeKind::Christoff2009 => ProbeScale::Likert { first: 1, last: 7 },
            ProbeKind::Mcvay2009 => ProbeScale::Choice(MCVAY_CHOICES),
            ProbeKind::Mason2007 => ProbeScale::Choice(MASON_CHOICES),
            ProbeKind::Killingsworth2010 => ProbeScale::Choice(KILLINGSWORTH_CHOICES),
            ProbeKind::Mrazek2013 => ProbeScale::Likert { first: 1, last: 5 },
        }
    }

    /// Labels a response can legally carry, in presentation order.
    pub fn response_labels(&self) -> Vec<String> {
        match self.scale() {
            ProbeScale::Likert { first, last } => (first..=last).map(|v| v.to_string()).collect(),
            ProbeScale::Choice(choices) => {
                choices.iter().map(|c| c.label.to_string()).collect()
            }
        }
    }
}
