//! Effects produced by state transitions

use super::event::Message;
use crate::activity::{Activity, UserId};
use chrono_tz::Tz;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the extraction service about a message; answered with
    /// `Event::EntitiesExtracted`
    ExtractEntities { message: Message },

    /// Load the user's recorded activities; answered with
    /// `Event::ActivitiesLoaded`
    LoadActivities { user_id: UserId },

    /// Insert or update the activity for its (user, type, day)
    PersistActivity { user_id: UserId, activity: Activity },

    /// Store a new timezone for the user
    PersistTimezone { user_id: UserId, timezone: Tz },
}

impl Effect {
    pub fn persist_activity(user_id: UserId, activity: Activity) -> Self {
        Effect::PersistActivity { user_id, activity }
    }
}
