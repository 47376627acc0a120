//! Pure state transition function
//!
//! Given a session and an event, decide the next session, the reply for the
//! user, and the effects the runtime has to carry out. Nothing in here does
//! I/O; collaborator results come back in as events.

use super::catalog::{self, CatalogError, Step};
use super::event::Message;
use super::{Effect, Event, Session, StateType, TurnContext};
use crate::activity::{calendar_day, render_summary, Activity, ActivityType};
use crate::nlp::{self, Resolution};
use crate::parse::{parse_count, parse_duration, parse_sentiment, parse_timezone};
use thiserror::Error;

pub const RECORDED: &str =
    "I finished writing that down, what activity type would you like to record next?";
pub const UNKNOWN_TYPE: &str =
    "Sorry, I don't know what type of activity that is. Try saying something like \"overall\".";
pub const TIMEZONE_SAVED: &str = "Thanks! Now what kind of activity would you like to record?";
pub const NOT_UNDERSTOOD: &str =
    "Sorry, I can't understand what you're saying. You can say \"help\" for some help getting started.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub session: Session,
    pub effects: Vec<Effect>,
    /// Text for the user; absent while waiting on a collaborator
    pub reply: Option<String>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            effects: vec![],
            reply: None,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Answers that fail validation come back as a reply with the session
/// untouched, so the same question is asked again.
pub fn transition(
    session: &Session,
    ctx: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (session.state, event) {
        // ============================================================
        // Choosing what to record
        // ============================================================
        (StateType::AskingActivityType, Event::UserMessage(message)) => {
            match message.command.as_str() {
                "timezone" => {
                    let mut next = session.clone();
                    next.state = StateType::AskingTimezone;
                    Ok(TransitionResult::new(next).with_reply(format!(
                        "Your current timezone is {}. What would you like to change it to?",
                        session.timezone
                    )))
                }
                "summary" => Ok(TransitionResult::new(session.clone()).with_effect(
                    Effect::LoadActivities {
                        user_id: session.user_id,
                    },
                )),
                _ => Ok(TransitionResult::new(session.clone())
                    .with_effect(Effect::ExtractEntities { message })),
            }
        }

        (StateType::AskingActivityType, Event::ActivitiesLoaded { activities }) => {
            let today = calendar_day(ctx.now, session.timezone);
            Ok(TransitionResult::new(session.clone())
                .with_reply(render_summary(&activities, today)))
        }

        (StateType::AskingActivityType, Event::EntitiesExtracted { message, entities }) => {
            if let Some(resolution) = nlp::resolve(&entities) {
                return fast_path(session, ctx, &message, resolution);
            }

            match catalog::determine_activity_type(&message.command) {
                Some(activity_type) => {
                    let step = catalog::start_for_type(activity_type)?;
                    let mut next = session.clone();
                    next.clear_pending();
                    next.activity_type = activity_type;
                    next.state = step.next;
                    Ok(TransitionResult::new(next).with_reply(step.prompt))
                }
                None => Ok(TransitionResult::new(session.clone()).with_reply(UNKNOWN_TYPE)),
            }
        }

        // ============================================================
        // Collecting fields
        // ============================================================
        (state, Event::UserMessage(message)) if state.is_collecting() => {
            collect_field(session, ctx, &message)
        }

        // ============================================================
        // Timezone
        // ============================================================
        (StateType::AskingTimezone, Event::UserMessage(message)) => {
            match parse_timezone(&message.text) {
                Ok(timezone) => {
                    let mut next = session.clone();
                    next.timezone = timezone;
                    next.state = StateType::AskingActivityType;
                    Ok(TransitionResult::new(next)
                        .with_effect(Effect::PersistTimezone {
                            user_id: session.user_id,
                            timezone,
                        })
                        .with_reply(TIMEZONE_SAVED))
                }
                Err(e) => Ok(TransitionResult::new(session.clone()).with_reply(e.reply())),
            }
        }

        (_, Event::UserMessage(_)) => {
            Ok(TransitionResult::new(session.clone()).with_reply(NOT_UNDERSTOOD))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} while in {state:?}",
            event_name(&event)
        ))),
    }
}

fn fast_path(
    session: &Session,
    ctx: &TurnContext,
    message: &Message,
    mut resolution: Resolution,
) -> Result<TransitionResult, TransitionError> {
    let activity_type = resolution.activity_type;
    let fields = catalog::fields_for_type(activity_type);
    resolution.states_to_skip.retain(|state| fields.contains(state));

    let start = catalog::start_for_type(activity_type)?;
    let step = catalog::fast_forward(activity_type, &resolution.states_to_skip, start)?;

    let when = resolution.desired_time.unwrap_or(ctx.now);
    let mut activity = Activity::started(activity_type, when, session.timezone, &message.text);
    if let Some(count) = resolution.count {
        activity.count = count;
    }
    if let Some(duration) = resolution.duration {
        activity.duration = duration;
    }

    let mut next = session.clone();
    next.activity_type = activity_type;
    next.states_to_skip = resolution.states_to_skip;
    Ok(advance(next, step, activity))
}

fn collect_field(
    session: &Session,
    ctx: &TurnContext,
    message: &Message,
) -> Result<TransitionResult, TransitionError> {
    let activity_type = session.activity_type;
    let step = catalog::next_step(activity_type, session.state)?;

    let mut next = session.clone();
    let mut activity = match next.pending.take() {
        Some(mut activity) => {
            activity.push_message(&message.text);
            activity
        }
        None => Activity::started(activity_type, ctx.now, session.timezone, &message.text),
    };

    let parsed = match session.state {
        StateType::AskingActivityValue => {
            parse_sentiment(&message.command).map(|v| activity.value = Some(v))
        }
        StateType::AskingActivityDuration => {
            parse_duration(&message.command).map(|d| activity.duration = d)
        }
        StateType::AskingActivityCount => {
            parse_count(&message.command).map(|n| activity.count = n)
        }
        other => {
            return Err(TransitionError::InvalidTransition(format!(
                "{other:?} does not collect a field"
            )))
        }
    };
    if let Err(e) = parsed {
        return Ok(TransitionResult::new(session.clone()).with_reply(e.reply()));
    }

    let step = catalog::fast_forward(activity_type, &session.states_to_skip, step)?;
    Ok(advance(next, step, activity))
}

/// Move to `step`, or finish the activity when the flow is complete
fn advance(mut next: Session, step: Step, activity: Activity) -> TransitionResult {
    if step.is_done() {
        next.clear_pending();
        next.activity_type = ActivityType::Unknown;
        next.state = StateType::AskingActivityType;
        let user_id = next.user_id;
        return TransitionResult::new(next)
            .with_effect(Effect::persist_activity(user_id, activity))
            .with_reply(RECORDED);
    }

    next.state = step.next;
    next.pending = Some(activity);
    TransitionResult::new(next).with_reply(step.prompt)
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::UserMessage(_) => "UserMessage",
        Event::EntitiesExtracted { .. } => "EntitiesExtracted",
        Event::ActivitiesLoaded { .. } => "ActivitiesLoaded",
    }
}
