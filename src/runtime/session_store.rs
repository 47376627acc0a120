//! Registry of live conversations with idle eviction
//!
//! One async mutex guards the whole map. The engine holds it for an entire
//! turn, collaborator calls included, and the sweeper takes the same lock, so
//! eviction never observes a session halfway through an update.

use super::traits::ActivityStore;
use crate::db::DbResult;
use crate::state_machine::Session;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How a session was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    Existing,
    Created { is_new_user: bool },
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Take the registry lock
    pub async fn lock(&self) -> Sessions<'_> {
        Sessions {
            map: self.sessions.lock().await,
            idle_timeout: self.idle_timeout,
        }
    }

    /// Evict every session idle for longer than the timeout
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.lock().await.sweep(now)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Run [`sweep`](Self::sweep) every half timeout until `cancel` fires
    pub fn spawn_sweeper(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        let period = (self.idle_timeout / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::debug!("Session sweeper stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        let evicted = store.sweep(Utc::now()).await;
                        if evicted > 0 {
                            tracing::info!(evicted, "Evicted idle sessions");
                        }
                    }
                }
            }
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

/// The locked registry
pub struct Sessions<'a> {
    map: MutexGuard<'a, HashMap<String, Session>>,
    idle_timeout: Duration,
}

impl Sessions<'_> {
    /// Return the live session for `id`, or provision the user and start a
    /// new one. A session past its idle timeout counts as absent even if the
    /// sweeper has not removed it yet.
    pub async fn get_or_create<S: ActivityStore + ?Sized>(
        &mut self,
        id: &str,
        store: &S,
        default_timezone: Tz,
        now: DateTime<Utc>,
    ) -> DbResult<Acquired> {
        if let Some(session) = self.map.get(id) {
            if session.idle_for(now) <= self.idle_timeout {
                return Ok(Acquired::Existing);
            }
            tracing::debug!(conv_id = %id, "Discarding expired session");
            self.map.remove(id);
        }

        let user = store.provision_user(id, default_timezone).await?;
        let session = Session::new(id, user.user_id, user.timezone, now);
        self.map.insert(id.to_string(), session);
        tracing::info!(conv_id = %id, user_id = user.user_id, new_user = user.is_new, "Session started");
        Ok(Acquired::Created {
            is_new_user: user.is_new,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.map.get(id)
    }

    /// Store the session, replacing any previous version
    pub fn insert(&mut self, session: Session) {
        self.map.insert(session.conversation_id.clone(), session);
    }

    pub fn remove(&mut self, id: &str) -> Option<Session> {
        self.map.remove(id)
    }

    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.map.len();
        let timeout = self.idle_timeout;
        self.map.retain(|_, session| session.idle_for(now) <= timeout);
        before - self.map.len()
    }
}
