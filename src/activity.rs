//! Activity records and the types they are built from

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::time::Duration;

pub type UserId = i64;
pub type ActivityId = i64;

/// Kind of tracked activity.
///
/// The discriminants are stored in the database. Only append to this list;
/// never renumber or reuse an existing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(i64)]
pub enum ActivityType {
    #[default]
    Unknown = 0,
    OverallDay = 1,
    Programming = 2,
    Laundry = 3,
    Running = 4,
    Meetings = 5,
    Reading = 6,
    Yoga = 7,
    Climbing = 8,
}

impl ActivityType {
    /// Every recordable type, in id order
    pub const KNOWN: [ActivityType; 8] = [
        ActivityType::OverallDay,
        ActivityType::Programming,
        ActivityType::Laundry,
        ActivityType::Running,
        ActivityType::Meetings,
        ActivityType::Reading,
        ActivityType::Yoga,
        ActivityType::Climbing,
    ];

    pub fn id(self) -> i64 {
        self as i64
    }

    /// Map a stored id back to a type. Ids written by a newer build map to `Unknown`.
    pub fn from_id(id: i64) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|t| t.id() == id)
            .unwrap_or(ActivityType::Unknown)
    }

    /// Name shown to users in the activity listing
    pub fn name(self) -> &'static str {
        match self {
            ActivityType::Unknown => "unknown",
            ActivityType::OverallDay => "day",
            ActivityType::Programming => "programming",
            ActivityType::Laundry => "laundry",
            ActivityType::Running => "running",
            ActivityType::Meetings => "meetings",
            ActivityType::Reading => "reading",
            ActivityType::Yoga => "yoga",
            ActivityType::Climbing => "climbing",
        }
    }
}

/// How the user felt about an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Terrible,
    Bad,
    Neutral,
    Good,
    Great,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Terrible => "terrible",
            Sentiment::Bad => "bad",
            Sentiment::Neutral => "neutral",
            Sentiment::Good => "good",
            Sentiment::Great => "great",
        }
    }

    /// Parse the canonical stored form (not the user-facing synonyms)
    pub fn from_canonical(s: &str) -> Option<Self> {
        match s {
            "terrible" => Some(Sentiment::Terrible),
            "bad" => Some(Sentiment::Bad),
            "neutral" => Some(Sentiment::Neutral),
            "good" => Some(Sentiment::Good),
            "great" => Some(Sentiment::Great),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded activity for a calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    /// Assigned by the store; `None` until first persisted
    pub id: Option<ActivityId>,
    pub activity_type: ActivityType,
    /// Calendar day in the user's timezone, anchored at UTC midnight when stored
    pub utc_date: NaiveDate,
    pub actual_time: DateTime<Utc>,
    pub value: Option<Sentiment>,
    pub count: i64,
    pub duration: Duration,
    /// Newline-joined transcript of the messages that supplied the fields
    pub raw_messages: String,
}

impl Activity {
    /// Start a new activity at `when`, dated by the user's local calendar day
    pub fn started(
        activity_type: ActivityType,
        when: DateTime<Utc>,
        timezone: Tz,
        first_message: &str,
    ) -> Self {
        Self {
            id: None,
            activity_type,
            utc_date: calendar_day(when, timezone),
            actual_time: when,
            value: None,
            count: 0,
            duration: Duration::ZERO,
            raw_messages: first_message.to_string(),
        }
    }

    /// Append another collected message to the transcript
    pub fn push_message(&mut self, message: &str) {
        if !self.raw_messages.is_empty() {
            self.raw_messages.push('\n');
        }
        self.raw_messages.push_str(message);
    }

    /// One-line, human readable description used by the daily summary
    pub fn describe(&self) -> String {
        let felt = self.value.map_or("", Sentiment::as_str);
        let ending = format!(" and felt {felt} about it.");
        let duration = short_duration(self.duration);
        match self.activity_type {
            ActivityType::OverallDay => format!("Your day was {felt}."),
            ActivityType::Programming => format!("You programmed for {duration}{ending}"),
            ActivityType::Laundry => format!("You did {} loads of laundry{ending}", self.count),
            ActivityType::Running => {
                format!("You ran {} miles in {duration}{ending}", self.count)
            }
            ActivityType::Meetings => {
                format!("You spent {duration} in {} meetings{ending}", self.count)
            }
            ActivityType::Reading => {
                format!("You read {} pages in {duration}{ending}", self.count)
            }
            ActivityType::Yoga => format!("You did yoga for {duration}{ending}"),
            ActivityType::Climbing => format!("You climbed for {duration}{ending}"),
            ActivityType::Unknown => "Unknown activity.".to_string(),
        }
    }
}

pub const NOTHING_RECORDED: &str = "You haven't recorded any activities yet today.";

/// Summary of everything recorded on `today`, ordered by activity type
pub fn render_summary(activities: &[Activity], today: NaiveDate) -> String {
    let mut todays: Vec<&Activity> = activities.iter().filter(|a| a.utc_date == today).collect();
    if todays.is_empty() {
        return NOTHING_RECORDED.to_string();
    }
    todays.sort_by_key(|a| a.activity_type);

    let mut out = String::from("Today you've recorded that:");
    for activity in todays {
        out.push_str("\n- ");
        out.push_str(&activity.describe());
    }
    out
}

/// The user's calendar day for an instant
pub fn calendar_day(instant: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    instant.with_timezone(&timezone).date_naive()
}

/// Compact duration rendering: `1h`, `1h30m`, `45m`, `1m30s`, `20s`
pub fn short_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&format!("{seconds}s"));

    if let Some(trimmed) = out.strip_suffix("m0s") {
        out = format!("{trimmed}m");
    }
    if let Some(trimmed) = out.strip_suffix("h0m") {
        out = format!("{trimmed}h");
    }
    out
}
