//! Trait abstractions for runtime I/O
//!
//! These traits let the engine run against in-memory doubles in tests.

use crate::activity::{Activity, ActivityId, UserId};
use crate::db::{DbResult, ProvisionedUser};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::sync::Arc;

/// Durable storage for users and their activities
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Resolve an external identity to a user, creating it on first contact
    async fn provision_user(
        &self,
        external_id: &str,
        default_timezone: Tz,
    ) -> DbResult<ProvisionedUser>;

    async fn set_timezone(&self, user_id: UserId, timezone: Tz) -> DbResult<()>;

    /// Insert or update by (user, type, day), returning the row id
    async fn upsert_activity(&self, user_id: UserId, activity: &Activity)
        -> DbResult<ActivityId>;

    /// Activities in insertion order
    async fn activities_for_user(&self, user_id: UserId) -> DbResult<Vec<Activity>>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ActivityStore + ?Sized> ActivityStore for Arc<T> {
    async fn provision_user(
        &self,
        external_id: &str,
        default_timezone: Tz,
    ) -> DbResult<ProvisionedUser> {
        (**self).provision_user(external_id, default_timezone).await
    }

    async fn set_timezone(&self, user_id: UserId, timezone: Tz) -> DbResult<()> {
        (**self).set_timezone(user_id, timezone).await
    }

    async fn upsert_activity(
        &self,
        user_id: UserId,
        activity: &Activity,
    ) -> DbResult<ActivityId> {
        (**self).upsert_activity(user_id, activity).await
    }

    async fn activities_for_user(&self, user_id: UserId) -> DbResult<Vec<Activity>> {
        (**self).activities_for_user(user_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;

/// Adapter to use Database as an `ActivityStore`
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityStore for DatabaseStorage {
    async fn provision_user(
        &self,
        external_id: &str,
        default_timezone: Tz,
    ) -> DbResult<ProvisionedUser> {
        self.db.provision_user(external_id, default_timezone)
    }

    async fn set_timezone(&self, user_id: UserId, timezone: Tz) -> DbResult<()> {
        self.db.set_timezone(user_id, timezone)
    }

    async fn upsert_activity(
        &self,
        user_id: UserId,
        activity: &Activity,
    ) -> DbResult<ActivityId> {
        self.db.upsert_activity(user_id, activity)
    }

    async fn activities_for_user(&self, user_id: UserId) -> DbResult<Vec<Activity>> {
        self.db.activities_for_user(user_id)
    }
}
