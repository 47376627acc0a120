//! Events that drive the dialogue

use crate::activity::Activity;
use crate::nlp::EntityMap;

/// An inbound message in both of the forms the dialogue needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Original text with line breaks collapsed; this is what gets stored
    pub text: String,
    /// Lower-cased, trimmed form used for command and answer matching
    pub command: String,
}

impl Message {
    pub fn normalize(raw: &str) -> Self {
        let text = raw.replace("\r\n", " ").replace(['\n', '\r'], " ");
        let command = text.trim().to_lowercase();
        Self { text, command }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage(Message),

    // Collaborator results
    EntitiesExtracted {
        message: Message,
        entities: EntityMap,
    },
    ActivitiesLoaded {
        activities: Vec<Activity>,
    },
}
