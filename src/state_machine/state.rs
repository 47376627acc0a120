//! Conversation state types

use crate::activity::{Activity, ActivityType, UserId};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

// ============================================================================
// State Type
// ============================================================================

/// Which question the conversation is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StateType {
    /// Not part of any flow; only reachable through a broken catalog
    #[default]
    Idle,
    /// Rest state, and the signal that a pending activity is complete
    AskingActivityType,
    AskingActivityValue,
    AskingActivityDuration,
    AskingActivityCount,
    AskingTimezone,
}

impl StateType {
    /// States that collect one field of the pending activity
    pub fn is_collecting(self) -> bool {
        matches!(
            self,
            StateType::AskingActivityValue
                | StateType::AskingActivityDuration
                | StateType::AskingActivityCount
        )
    }
}

// ============================================================================
// Session
// ============================================================================

/// Per-conversation dialogue state
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub conversation_id: String,
    pub start_time: DateTime<Utc>,
    pub last_message_time: DateTime<Utc>,
    pub state: StateType,
    /// Collection states already answered by the fast path
    pub states_to_skip: HashSet<StateType>,
    pub activity_type: ActivityType,
    /// Present only while an activity is being collected
    pub pending: Option<Activity>,
    pub user_id: UserId,
    pub timezone: Tz,
}

impl Session {
    pub fn new(
        conversation_id: impl Into<String>,
        user_id: UserId,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            start_time: now,
            last_message_time: now,
            state: StateType::AskingActivityType,
            states_to_skip: HashSet::new(),
            activity_type: ActivityType::Unknown,
            pending: None,
            user_id,
            timezone,
        }
    }

    /// How long the conversation has been quiet at `now`
    pub fn idle_for(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.last_message_time).to_std().unwrap_or_default()
    }

    /// Drop everything scoped to the activity being collected
    pub fn clear_pending(&mut self) {
        self.pending = None;
        self.states_to_skip.clear();
    }
}

/// Inputs a transition may read but never changes
#[derive(Debug, Clone, Copy)]
pub struct TurnContext {
    pub now: DateTime<Utc>,
}

impl TurnContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}
