//! Per-activity question sequences
//!
//! Each activity type declares the fields it collects, in order, together with
//! the prompt that asks for each one. Everything here is pure data; the
//! transition function walks it to decide what to ask next.

use super::state::StateType;
use crate::activity::ActivityType;
use std::collections::HashSet;
use thiserror::Error;

/// Where the conversation goes after an answer, and what to say there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub next: StateType,
    pub prompt: &'static str,
}

impl Step {
    /// Final step of every flow: the pending activity is complete
    pub const DONE: Step = Step {
        next: StateType::AskingActivityType,
        prompt: "",
    };

    pub fn is_done(&self) -> bool {
        self.next == StateType::AskingActivityType
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no flow is defined for {0:?}")]
    UnknownType(ActivityType),
    #[error("{activity_type:?} never asks for {state:?}")]
    MissingEntry {
        activity_type: ActivityType,
        state: StateType,
    },
}

struct Field {
    state: StateType,
    prompt: &'static str,
}

struct Flow {
    activity_type: ActivityType,
    fields: &'static [Field],
}

const SENTIMENT: Field = Field {
    state: StateType::AskingActivityValue,
    prompt: "Okay, and how did you feel about that?",
};

const FLOWS: &[Flow] = &[
    Flow {
        activity_type: ActivityType::OverallDay,
        fields: &[Field {
            state: StateType::AskingActivityValue,
            prompt: "How was your day?",
        }],
    },
    Flow {
        activity_type: ActivityType::Programming,
        fields: &[
            Field {
                state: StateType::AskingActivityDuration,
                prompt: "How long did you program for?",
            },
            SENTIMENT,
        ],
    },
    Flow {
        activity_type: ActivityType::Laundry,
        fields: &[
            Field {
                state: StateType::AskingActivityCount,
                prompt: "How many loads of laundry did you do?",
            },
            SENTIMENT,
        ],
    },
    Flow {
        activity_type: ActivityType::Running,
        fields: &[
            Field {
                state: StateType::AskingActivityCount,
                prompt: "How far did you run in miles?",
            },
            Field {
                state: StateType::AskingActivityDuration,
                prompt: "How long did you run for?",
            },
            SENTIMENT,
        ],
    },
    Flow {
        activity_type: ActivityType::Meetings,
        fields: &[
            Field {
                state: StateType::AskingActivityCount,
                prompt: "How many meetings did you go to?",
            },
            Field {
                state: StateType::AskingActivityDuration,
                prompt: "What was the total time you spent in meetings?",
            },
            SENTIMENT,
        ],
    },
    Flow {
        activity_type: ActivityType::Reading,
        fields: &[
            Field {
                state: StateType::AskingActivityCount,
                prompt: "How many pages did you read?",
            },
            Field {
                state: StateType::AskingActivityDuration,
                prompt: "How long did you read for?",
            },
            SENTIMENT,
        ],
    },
    Flow {
        activity_type: ActivityType::Yoga,
        fields: &[
            Field {
                state: StateType::AskingActivityDuration,
                prompt: "How long did you do yoga for?",
            },
            SENTIMENT,
        ],
    },
    Flow {
        activity_type: ActivityType::Climbing,
        fields: &[
            Field {
                state: StateType::AskingActivityDuration,
                prompt: "How long did you climb for?",
            },
            SENTIMENT,
        ],
    },
];

fn flow(activity_type: ActivityType) -> Result<&'static Flow, CatalogError> {
    FLOWS
        .iter()
        .find(|f| f.activity_type == activity_type)
        .ok_or(CatalogError::UnknownType(activity_type))
}

/// Collection states for a type, in the order they are asked
pub fn fields_for_type(activity_type: ActivityType) -> Vec<StateType> {
    flow(activity_type)
        .map(|f| f.fields.iter().map(|field| field.state).collect())
        .unwrap_or_default()
}

/// The first question for a freshly selected activity type
pub fn start_for_type(activity_type: ActivityType) -> Result<Step, CatalogError> {
    let first = flow(activity_type)?
        .fields
        .first()
        .ok_or(CatalogError::UnknownType(activity_type))?;
    Ok(Step {
        next: first.state,
        prompt: first.prompt,
    })
}

/// The step that follows a successful answer in `state`
pub fn next_step(activity_type: ActivityType, state: StateType) -> Result<Step, CatalogError> {
    let fields = flow(activity_type)?.fields;
    let index = fields
        .iter()
        .position(|field| field.state == state)
        .ok_or(CatalogError::MissingEntry {
            activity_type,
            state,
        })?;
    Ok(fields.get(index + 1).map_or(Step::DONE, |field| Step {
        next: field.state,
        prompt: field.prompt,
    }))
}

/// Advance past every state the fast path already answered.
///
/// Each hop moves strictly forward through the type's field list, so this
/// performs at most one hop per declared field.
pub fn fast_forward(
    activity_type: ActivityType,
    skip: &HashSet<StateType>,
    mut step: Step,
) -> Result<Step, CatalogError> {
    while !step.is_done() && skip.contains(&step.next) {
        step = next_step(activity_type, step.next)?;
    }
    Ok(step)
}

/// Literal keyword fallback used when entity extraction finds no type
pub fn determine_activity_type(command: &str) -> Option<ActivityType> {
    let activity_type = match command {
        "overall" | "overall day" | "day" => ActivityType::OverallDay,
        "programming" | "programmed" | "wrote code" | "coded" => ActivityType::Programming,
        "laundry" => ActivityType::Laundry,
        "ran" | "went for a run" | "running" | "went running" => ActivityType::Running,
        "met" | "meeting" | "meetings" => ActivityType::Meetings,
        "reading" | "read" => ActivityType::Reading,
        "yoga" => ActivityType::Yoga,
        "climbing" => ActivityType::Climbing,
        _ => return None,
    };
    Some(activity_type)
}
