//! Fast path: turn extracted entities into a partially filled activity

use super::entity::{Entity, EntityKind, EntityMap};
use crate::activity::ActivityType;
use crate::state_machine::StateType;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;

/// An entity name that identifies an activity type, and the entity names
/// worth reading for that type
struct Trigger {
    entity: &'static str,
    activity_type: ActivityType,
    fields: &'static [(&'static str, EntityKind)],
}

const DURATION: (&str, EntityKind) = ("duration", EntityKind::Duration);

/// Ordered by activity type id; when several triggers appear in one
/// message the first match here wins.
const TRIGGERS: &[Trigger] = &[
    Trigger {
        entity: "programming",
        activity_type: ActivityType::Programming,
        fields: &[DURATION],
    },
    Trigger {
        entity: "laundry",
        activity_type: ActivityType::Laundry,
        fields: &[("loads", EntityKind::Quantity)],
    },
    Trigger {
        entity: "running",
        activity_type: ActivityType::Running,
        fields: &[DURATION, ("distance", EntityKind::Distance)],
    },
    Trigger {
        entity: "meeting",
        activity_type: ActivityType::Meetings,
        fields: &[DURATION, ("meetings", EntityKind::Quantity)],
    },
    Trigger {
        entity: "reading",
        activity_type: ActivityType::Reading,
        fields: &[DURATION, ("pages", EntityKind::Quantity)],
    },
    Trigger {
        entity: "yoga",
        activity_type: ActivityType::Yoga,
        fields: &[DURATION],
    },
    Trigger {
        entity: "climbing",
        activity_type: ActivityType::Climbing,
        fields: &[DURATION],
    },
];

const DATETIME_ENTITY: &str = "datetime";

/// What the fast path could work out from one message
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub activity_type: ActivityType,
    pub count: Option<i64>,
    pub duration: Option<Duration>,
    /// When the message says the activity happened, if it says so
    pub desired_time: Option<DateTime<Utc>>,
    /// Collection states answered by this message
    pub states_to_skip: HashSet<StateType>,
}

impl Resolution {
    fn new(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            count: None,
            duration: None,
            desired_time: None,
            states_to_skip: HashSet::new(),
        }
    }
}

/// Resolve entities into an activity draft.
///
/// Returns `None` when no entity names a known activity type, in which case
/// the caller falls back to keyword matching. Fields that fail to parse are
/// left for the user to answer; they never block the others.
pub fn resolve(entities: &EntityMap) -> Option<Resolution> {
    let trigger = TRIGGERS
        .iter()
        .find(|t| entities.contains_key(t.entity))?;
    let mut resolution = Resolution::new(trigger.activity_type);

    for (name, kind) in trigger.fields {
        let Some(payloads) = entities.get(*name) else {
            continue;
        };
        match kind.parse(payloads) {
            Ok(Entity::Duration(d)) => {
                resolution.duration = Some(d);
                resolution
                    .states_to_skip
                    .insert(StateType::AskingActivityDuration);
            }
            Ok(Entity::Quantity(n) | Entity::Distance(n)) => {
                resolution.count = Some(n);
                resolution.states_to_skip.insert(StateType::AskingActivityCount);
            }
            Ok(Entity::DateTime(_)) => {}
            Err(e) => {
                tracing::debug!(entity = %name, error = %e, "Ignoring unparseable entity");
            }
        }
    }

    if let Some(payloads) = entities.get(DATETIME_ENTITY) {
        match EntityKind::DateTime.parse(payloads) {
            Ok(Entity::DateTime(dt)) => resolution.desired_time = Some(dt),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "Ignoring unparseable datetime"),
        }
    }

    Some(resolution)
}
