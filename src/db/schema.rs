//! Database schema and types

use crate::activity::UserId;
use chrono_tz::Tz;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    timezone TEXT NOT NULL DEFAULT 'UTC'
);

CREATE TABLE IF NOT EXISTS activity (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    type INTEGER NOT NULL,
    -- Unix seconds of the user's calendar day at UTC midnight
    date INTEGER NOT NULL,
    time TEXT NOT NULL,
    value TEXT,
    raw_messages TEXT NOT NULL,
    -- Nanoseconds
    duration INTEGER NOT NULL DEFAULT 0,
    count INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_activity_user_type_date
    ON activity(user_id, type, date);
";

/// Outcome of looking up (or creating) a user by external identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedUser {
    pub user_id: UserId,
    pub timezone: Tz,
    /// True when this call created the user
    pub is_new: bool,
}
