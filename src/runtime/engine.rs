//! Per-message dialogue driver
//!
//! [`DialogEngine::handle`] takes one inbound message and produces exactly
//! one reply. It resolves the session, handles the commands that ignore
//! dialogue state, then runs the pure state machine and executes its
//! effects against the collaborators.

use super::session_store::{Acquired, SessionStore};
use super::traits::ActivityStore;
use crate::activity::ActivityType;
use crate::db::DbError;
use crate::nlp::{EntityExtractor, NlpError};
use crate::state_machine::transition::NOT_UNDERSTOOD;
use crate::state_machine::{
    transition, Effect, Event, Message, Session, TransitionError, TurnContext,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::VecDeque;
use std::sync::LazyLock;
use thiserror::Error;

pub const NEW_USER_GREETING: &str = "Hello! What type of activity do you want to record?\n\
    Say \"summary\" to see what you've recorded today, or \"help\" for other commands.";
pub const RETURNING_GREETING: &str = "Welcome back! What activity do you want to record?";
pub const FAREWELL: &str = "Have a nice day!";
pub const CANNOT_START: &str =
    "Sorry, I can't handle new conversations at this time. Try again shortly.";
pub const HELP: &str = "Say \"activities\" to see the available activity types.\n\
    Say \"summary\" to see what you've recorded today.\n\
    Say \"timezone\" to see and change your timezone.\n\
    If you ever need to stop or quit recording a message, either word works.";

pub static ACTIVITY_LISTING: LazyLock<String> = LazyLock::new(|| {
    let names: Vec<&str> = ActivityType::KNOWN.iter().map(|t| t.name()).collect();
    format!("Available activities are the following: {}", names.join(", "))
});

const EXIT_COMMANDS: [&str; 5] = ["quit", "abort", "done", "finished", "stop"];

/// A collaborator failure during one turn
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("state machine: {0}")]
    Transition(#[from] TransitionError),
    #[error("entity extraction: {0}")]
    Nlp(#[from] NlpError),
    #[error("saving activity: {0}")]
    SaveActivity(#[source] DbError),
    #[error("saving timezone: {0}")]
    SaveTimezone(#[source] DbError),
    #[error("loading activities: {0}")]
    LoadActivities(#[source] DbError),
}

impl TurnError {
    /// What the user is told; the session stays where it was so they can retry
    pub fn reply(&self) -> &'static str {
        match self {
            TurnError::Transition(_) => {
                "Sorry, the programmer messed this up. Please let them know."
            }
            TurnError::Nlp(_) => "Sorry, there was an error parsing your message.",
            TurnError::SaveActivity(_) => {
                "Whoops, there was a problem saving your activity, try again shortly."
            }
            TurnError::SaveTimezone(_) => {
                "Whoops, there was a problem saving your timezone, try again shortly."
            }
            TurnError::LoadActivities(_) => {
                "There was an error fetching your summary. Try again shortly."
            }
        }
    }
}

/// Anything that can answer an inbound message
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, conversation_id: &str, text: &str) -> String;
}

pub struct DialogEngine<S, N> {
    store: S,
    extractor: N,
    sessions: SessionStore,
    default_timezone: Tz,
}

impl<S: ActivityStore, N: EntityExtractor> DialogEngine<S, N> {
    pub fn new(store: S, extractor: N, sessions: SessionStore) -> Self {
        Self {
            store,
            extractor,
            sessions,
            default_timezone: chrono_tz::UTC,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle a message as if it arrived at `now`
    pub async fn handle_at(&self, conv_id: &str, raw: &str, now: DateTime<Utc>) -> String {
        let message = Message::normalize(raw);
        match message.command.as_str() {
            "help" => return HELP.to_string(),
            "activities" => return ACTIVITY_LISTING.clone(),
            _ => {}
        }

        let mut sessions = self.sessions.lock().await;
        match sessions
            .get_or_create(conv_id, &self.store, self.default_timezone, now)
            .await
        {
            Ok(Acquired::Existing) => {}
            Ok(Acquired::Created { is_new_user: true }) => return NEW_USER_GREETING.to_string(),
            Ok(Acquired::Created { is_new_user: false }) => {
                return RETURNING_GREETING.to_string()
            }
            Err(e) => {
                tracing::error!(conv_id = %conv_id, error = %e, "Failed to provision user");
                return CANNOT_START.to_string();
            }
        }

        if EXIT_COMMANDS.contains(&message.command.as_str()) {
            sessions.remove(conv_id);
            tracing::info!(conv_id = %conv_id, "Session ended by user");
            return FAREWELL.to_string();
        }

        let Some(session) = sessions.get(conv_id).cloned() else {
            return CANNOT_START.to_string();
        };
        let from = session.state;

        match self.run_turn(session, message, now).await {
            Ok((mut next, reply)) => {
                tracing::debug!(conv_id = %conv_id, from = ?from, to = ?next.state, "Turn complete");
                next.last_message_time = now;
                sessions.insert(next);
                reply
            }
            Err(e) => {
                tracing::error!(conv_id = %conv_id, state = ?from, error = %e, "Turn failed");
                e.reply().to_string()
            }
        }
    }

    /// Feed the message through the state machine until no effect asks for
    /// more input. Nothing is committed here; the caller stores the session
    /// only when the whole turn succeeded.
    async fn run_turn(
        &self,
        mut session: Session,
        message: Message,
        now: DateTime<Utc>,
    ) -> Result<(Session, String), TurnError> {
        let ctx = TurnContext::new(now);
        let mut events = VecDeque::from([Event::UserMessage(message)]);
        let mut reply = None;

        while let Some(event) = events.pop_front() {
            let result = transition(&session, &ctx, event)?;
            session = result.session;
            if result.reply.is_some() {
                reply = result.reply;
            }
            for effect in result.effects {
                if let Some(follow_up) = self.execute_effect(effect).await? {
                    events.push_back(follow_up);
                }
            }
        }

        Ok((session, reply.unwrap_or_else(|| NOT_UNDERSTOOD.to_string())))
    }

    async fn execute_effect(&self, effect: Effect) -> Result<Option<Event>, TurnError> {
        match effect {
            Effect::ExtractEntities { message } => {
                let entities = self.extractor.extract(&message.text).await?;
                Ok(Some(Event::EntitiesExtracted { message, entities }))
            }
            Effect::LoadActivities { user_id } => {
                let activities = self
                    .store
                    .activities_for_user(user_id)
                    .await
                    .map_err(TurnError::LoadActivities)?;
                Ok(Some(Event::ActivitiesLoaded { activities }))
            }
            Effect::PersistActivity { user_id, activity } => {
                let id = self
                    .store
                    .upsert_activity(user_id, &activity)
                    .await
                    .map_err(TurnError::SaveActivity)?;
                tracing::info!(
                    user_id,
                    activity_id = id,
                    activity_type = activity.activity_type.name(),
                    "Activity recorded"
                );
                Ok(None)
            }
            Effect::PersistTimezone { user_id, timezone } => {
                self.store
                    .set_timezone(user_id, timezone)
                    .await
                    .map_err(TurnError::SaveTimezone)?;
                tracing::info!(user_id, timezone = %timezone, "Timezone updated");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<S: ActivityStore, N: EntityExtractor> MessageHandler for DialogEngine<S, N> {
    async fn handle(&self, conversation_id: &str, text: &str) -> String {
        self.handle_at(conversation_id, text, Utc::now()).await
    }
}
