//! SQLite persistence for users and their activities

mod schema;

pub use schema::*;

use crate::activity::{Activity, ActivityId, ActivityType, Sentiment, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("Stored timezone is not valid: {0}")]
    InvalidTimezone(String),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
    #[error("Duration {0:?} does not fit in storage")]
    DurationOutOfRange(Duration),
    #[allow(dead_code)] // Raised by test doubles
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== User Operations ====================

    /// Find the user for an external identity, creating it with
    /// `default_timezone` on first contact
    pub fn provision_user(
        &self,
        external_id: &str,
        default_timezone: Tz,
    ) -> DbResult<ProvisionedUser> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let existing: Option<(UserId, String)> = tx
            .query_row(
                "SELECT id, timezone FROM users WHERE external_id = ?1",
                params![external_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let user = match existing {
            Some((user_id, timezone)) => ProvisionedUser {
                user_id,
                timezone: parse_timezone(&timezone)?,
                is_new: false,
            },
            None => {
                tx.execute(
                    "INSERT INTO users (external_id, timezone) VALUES (?1, ?2)",
                    params![external_id, default_timezone.name()],
                )?;
                ProvisionedUser {
                    user_id: tx.last_insert_rowid(),
                    timezone: default_timezone,
                    is_new: true,
                }
            }
        };

        tx.commit()?;
        Ok(user)
    }

    pub fn set_timezone(&self, user_id: UserId, timezone: Tz) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE users SET timezone = ?1 WHERE id = ?2",
            params![timezone.name(), user_id],
        )?;
        if updated == 0 {
            return Err(DbError::UserNotFound(user_id));
        }
        Ok(())
    }

    // ==================== Activity Operations ====================

    /// Insert the activity, or update the existing row for the same
    /// (user, type, day). The id of an existing row is preserved.
    pub fn upsert_activity(&self, user_id: UserId, activity: &Activity) -> DbResult<ActivityId> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let date = day_to_unix(activity.utc_date);
        let time = activity.actual_time.to_rfc3339();
        let value = activity.value.map(Sentiment::as_str);
        let duration = duration_to_nanos(activity.duration)?;

        let existing: Option<ActivityId> = tx
            .query_row(
                "SELECT id FROM activity WHERE user_id = ?1 AND type = ?2 AND date = ?3",
                params![user_id, activity.activity_type.id(), date],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE activity
                     SET time = ?1, value = ?2, raw_messages = ?3, duration = ?4, count = ?5
                     WHERE id = ?6",
                    params![time, value, activity.raw_messages, duration, activity.count, id],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO activity (user_id, type, date, time, value, raw_messages, duration, count)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        user_id,
                        activity.activity_type.id(),
                        date,
                        time,
                        value,
                        activity.raw_messages,
                        duration,
                        activity.count
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.commit()?;
        Ok(id)
    }

    /// All of a user's activities, oldest first
    pub fn activities_for_user(&self, user_id: UserId) -> DbResult<Vec<Activity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, type, date, time, value, raw_messages, duration, count
             FROM activity WHERE user_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(ActivityRow {
                id: row.get(0)?,
                activity_type: row.get(1)?,
                date: row.get(2)?,
                time: row.get(3)?,
                value: row.get(4)?,
                raw_messages: row.get(5)?,
                duration: row.get(6)?,
                count: row.get(7)?,
            })
        })?;

        rows.map(|row| row?.into_activity()).collect()
    }
}

struct ActivityRow {
    id: ActivityId,
    activity_type: i64,
    date: i64,
    time: String,
    value: Option<String>,
    raw_messages: String,
    duration: i64,
    count: i64,
}

impl ActivityRow {
    fn into_activity(self) -> DbResult<Activity> {
        let utc_date = DateTime::from_timestamp(self.date, 0)
            .ok_or_else(|| DbError::Corrupt(format!("date {}", self.date)))?
            .date_naive();
        let actual_time = DateTime::parse_from_rfc3339(&self.time)
            .map_err(|_| DbError::Corrupt(format!("time {:?}", self.time)))?
            .with_timezone(&Utc);
        let value = match self.value.as_deref() {
            None => None,
            Some(s) => Some(
                Sentiment::from_canonical(s)
                    .ok_or_else(|| DbError::Corrupt(format!("value {s:?}")))?,
            ),
        };
        let duration = u64::try_from(self.duration)
            .map(Duration::from_nanos)
            .map_err(|_| DbError::Corrupt(format!("duration {}", self.duration)))?;

        Ok(Activity {
            id: Some(self.id),
            activity_type: ActivityType::from_id(self.activity_type),
            utc_date,
            actual_time,
            value,
            count: self.count,
            duration,
            raw_messages: self.raw_messages,
        })
    }
}

fn day_to_unix(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn duration_to_nanos(duration: Duration) -> DbResult<i64> {
    i64::try_from(duration.as_nanos())
        .map_err(|_| DbError::DurationOutOfRange(duration))
}

fn parse_timezone(s: &str) -> DbResult<Tz> {
    s.parse::<Tz>()
        .map_err(|_| DbError::InvalidTimezone(s.to_string()))
}
