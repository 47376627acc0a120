//! Mock implementations for testing
//!
//! These mocks let the engine run whole conversations without real I/O.

use super::traits::ActivityStore;
use crate::activity::{Activity, ActivityId, UserId};
use crate::db::{DbError, DbResult, ProvisionedUser};
use crate::nlp::{EntityExtractor, EntityMap, NlpError};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// In-Memory Activity Store
// ============================================================================

#[derive(Default)]
struct StoreData {
    /// (external id, timezone), indexed by user id - 1
    users: Vec<(String, Tz)>,
    /// (owner, activity), activity ids assigned from position
    activities: Vec<(UserId, Activity)>,
}

/// In-memory `ActivityStore` with switchable failures
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
    fail_provisioning: AtomicBool,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_provisioning(&self, fail: bool) {
        self.fail_provisioning.store(fail, Ordering::SeqCst);
    }

    /// Make activity and timezone writes fail
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn user_id(&self, external_id: &str) -> Option<UserId> {
        let data = self.data.lock().unwrap();
        data.users
            .iter()
            .position(|(id, _)| id == external_id)
            .map(to_user_id)
    }

    pub fn timezone(&self, user_id: UserId) -> Option<Tz> {
        let data = self.data.lock().unwrap();
        user_index(user_id).and_then(|i| data.users.get(i).map(|(_, tz)| *tz))
    }

    /// Everything stored for a user, in insertion order
    pub fn activities(&self, user_id: UserId) -> Vec<Activity> {
        let data = self.data.lock().unwrap();
        data.activities
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, activity)| activity.clone())
            .collect()
    }

    fn check(flag: &AtomicBool, what: &str) -> DbResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(format!("{what} disabled by test")));
        }
        Ok(())
    }
}

#[allow(clippy::cast_possible_wrap)]
fn to_user_id(index: usize) -> UserId {
    index as UserId + 1
}

fn user_index(user_id: UserId) -> Option<usize> {
    usize::try_from(user_id - 1).ok()
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn provision_user(
        &self,
        external_id: &str,
        default_timezone: Tz,
    ) -> DbResult<ProvisionedUser> {
        Self::check(&self.fail_provisioning, "provisioning")?;
        let mut data = self.data.lock().unwrap();
        if let Some(index) = data.users.iter().position(|(id, _)| id == external_id) {
            return Ok(ProvisionedUser {
                user_id: to_user_id(index),
                timezone: data.users[index].1,
                is_new: false,
            });
        }
        data.users.push((external_id.to_string(), default_timezone));
        Ok(ProvisionedUser {
            user_id: to_user_id(data.users.len() - 1),
            timezone: default_timezone,
            is_new: true,
        })
    }

    async fn set_timezone(&self, user_id: UserId, timezone: Tz) -> DbResult<()> {
        Self::check(&self.fail_saves, "saves")?;
        let mut data = self.data.lock().unwrap();
        let user = user_index(user_id)
            .and_then(|i| data.users.get_mut(i))
            .ok_or(DbError::UserNotFound(user_id))?;
        user.1 = timezone;
        Ok(())
    }

    async fn upsert_activity(
        &self,
        user_id: UserId,
        activity: &Activity,
    ) -> DbResult<ActivityId> {
        Self::check(&self.fail_saves, "saves")?;
        let mut data = self.data.lock().unwrap();
        let existing = data.activities.iter_mut().find(|(owner, stored)| {
            *owner == user_id
                && stored.activity_type == activity.activity_type
                && stored.utc_date == activity.utc_date
        });
        if let Some((_, stored)) = existing {
            let id = stored.id;
            *stored = Activity {
                id,
                ..activity.clone()
            };
            return id.ok_or_else(|| DbError::Corrupt("stored activity without id".into()));
        }

        #[allow(clippy::cast_possible_wrap)]
        let id = data.activities.len() as ActivityId + 1;
        data.activities.push((
            user_id,
            Activity {
                id: Some(id),
                ..activity.clone()
            },
        ));
        Ok(id)
    }

    async fn activities_for_user(&self, user_id: UserId) -> DbResult<Vec<Activity>> {
        Self::check(&self.fail_loads, "loads")?;
        Ok(self.activities(user_id))
    }
}

// ============================================================================
// Mock Entity Extractor
// ============================================================================

/// Extractor that replays queued results, then finds nothing
#[derive(Default)]
pub struct MockExtractor {
    responses: Mutex<VecDeque<Result<EntityMap, NlpError>>>,
    /// Every text the engine asked about
    pub requests: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_entities(&self, entities: EntityMap) {
        self.responses.lock().unwrap().push_back(Ok(entities));
    }

    pub fn queue_error(&self, error: NlpError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityExtractor for MockExtractor {
    async fn extract(&self, text: &str) -> Result<EntityMap, NlpError> {
        self.requests.lock().unwrap().push(text.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EntityMap::new()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityType, Sentiment, NOTHING_RECORDED};
    use crate::nlp::EntityPayload;
    use crate::runtime::engine::{
        DialogEngine, ACTIVITY_LISTING, CANNOT_START, FAREWELL, HELP, NEW_USER_GREETING,
        RETURNING_GREETING,
    };
    use crate::runtime::SessionStore;
    use crate::state_machine::transition::{RECORDED, TIMEZONE_SAVED, UNKNOWN_TYPE};
    use crate::state_machine::StateType;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use std::sync::Arc;
    use std::time::Duration;

    const SENTIMENT_PROMPT: &str = "Okay, and how did you feel about that?";

    type TestEngine = DialogEngine<Arc<InMemoryStore>, Arc<MockExtractor>>;

    struct Harness {
        engine: TestEngine,
        store: Arc<InMemoryStore>,
        extractor: Arc<MockExtractor>,
        now: DateTime<Utc>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_timeout(Duration::from_secs(300))
        }

        fn with_timeout(timeout: Duration) -> Self {
            let store = Arc::new(InMemoryStore::new());
            let extractor = Arc::new(MockExtractor::new());
            let engine =
                DialogEngine::new(store.clone(), extractor.clone(), SessionStore::new(timeout));
            Self {
                engine,
                store,
                extractor,
                now: Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap(),
            }
        }

        fn starting_at(mut self, now: DateTime<Utc>) -> Self {
            self.now = now;
            self
        }

        /// Send one message, one second after the previous
        async fn say(&mut self, text: &str) -> String {
            self.now += chrono::Duration::seconds(1);
            self.engine.handle_at("fb1", text, self.now).await
        }

        async fn run(&mut self, inputs: &[&str]) -> Vec<String> {
            let mut outputs = Vec::with_capacity(inputs.len());
            for input in inputs {
                outputs.push(self.say(input).await);
            }
            outputs
        }

        async fn state(&self) -> Option<StateType> {
            self.engine
                .sessions()
                .lock()
                .await
                .get("fb1")
                .map(|s| s.state)
        }

        fn stored(&self) -> Vec<Activity> {
            self.store
                .user_id("fb1")
                .map(|id| self.store.activities(id))
                .unwrap_or_default()
        }

        fn only_activity(&self) -> Activity {
            let stored = self.stored();
            assert_eq!(stored.len(), 1, "expected one activity, got {stored:?}");
            stored.into_iter().next().unwrap()
        }
    }

    fn entities(pairs: &[(&str, EntityPayload)]) -> EntityMap {
        pairs
            .iter()
            .map(|(name, payload)| ((*name).to_string(), vec![payload.clone()]))
            .collect()
    }

    // ------------------------------------------------------------------
    // Slow path, one test per activity type
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_overall_day() {
        let mut h = Harness::new();
        let outputs = h.run(&["start", "day", "great", "finished"]).await;
        assert_eq!(
            outputs,
            vec![NEW_USER_GREETING, "How was your day?", RECORDED, FAREWELL]
        );

        let activity = h.only_activity();
        assert_eq!(activity.activity_type, ActivityType::OverallDay);
        assert_eq!(activity.value, Some(Sentiment::Great));
        assert_eq!(activity.raw_messages, "great");
        assert_eq!(activity.utc_date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[tokio::test]
    async fn test_overall_synonym_keeps_original_text() {
        let mut h = Harness::new();
        h.run(&["Start", "Overall", "AWESOME", "finished"]).await;
        let activity = h.only_activity();
        assert_eq!(activity.value, Some(Sentiment::Great));
        assert_eq!(activity.raw_messages, "AWESOME");
    }

    #[tokio::test]
    async fn test_programming() {
        let mut h = Harness::new();
        let outputs = h.run(&["Start", "wrote CODE", "10m", "meh"]).await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How long did you program for?",
                SENTIMENT_PROMPT,
                RECORDED
            ]
        );
        let activity = h.only_activity();
        assert_eq!(activity.activity_type, ActivityType::Programming);
        assert_eq!(activity.duration, Duration::from_secs(600));
        assert_eq!(activity.value, Some(Sentiment::Neutral));
        assert_eq!(activity.raw_messages, "10m\nmeh");
    }

    #[tokio::test]
    async fn test_laundry() {
        let mut h = Harness::new();
        let outputs = h.run(&["Start", "laundry", "2", "not good"]).await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How many loads of laundry did you do?",
                SENTIMENT_PROMPT,
                RECORDED
            ]
        );
        let activity = h.only_activity();
        assert_eq!(activity.count, 2);
        assert_eq!(activity.value, Some(Sentiment::Bad));
    }

    #[tokio::test]
    async fn test_running() {
        let mut h = Harness::new();
        let outputs = h.run(&["Start", "went for a run", "3", "25m", "fantastic"]).await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How far did you run in miles?",
                "How long did you run for?",
                SENTIMENT_PROMPT,
                RECORDED
            ]
        );
        let activity = h.only_activity();
        assert_eq!(activity.activity_type, ActivityType::Running);
        assert_eq!(activity.count, 3);
        assert_eq!(activity.duration, Duration::from_secs(25 * 60));
        assert_eq!(activity.value, Some(Sentiment::Great));
        assert_eq!(activity.raw_messages, "3\n25m\nfantastic");
    }

    #[tokio::test]
    async fn test_meetings() {
        let mut h = Harness::new();
        let outputs = h.run(&["Start", "met", "4", "3h", "terrible"]).await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How many meetings did you go to?",
                "What was the total time you spent in meetings?",
                SENTIMENT_PROMPT,
                RECORDED
            ]
        );
        let activity = h.only_activity();
        assert_eq!(activity.activity_type, ActivityType::Meetings);
        assert_eq!(activity.count, 4);
        assert_eq!(activity.duration, Duration::from_secs(3 * 3600));
        assert_eq!(activity.value, Some(Sentiment::Terrible));
    }

    #[tokio::test]
    async fn test_reading() {
        let mut h = Harness::new();
        let outputs = h.run(&["Start", "read", "40", "1h30m", "good"]).await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How many pages did you read?",
                "How long did you read for?",
                SENTIMENT_PROMPT,
                RECORDED
            ]
        );
        let activity = h.only_activity();
        assert_eq!(activity.count, 40);
        assert_eq!(activity.duration, Duration::from_secs(5400));
    }

    #[tokio::test]
    async fn test_yoga() {
        let mut h = Harness::new();
        let outputs = h.run(&["Start", "yoga", "1h", "alright"]).await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How long did you do yoga for?",
                SENTIMENT_PROMPT,
                RECORDED
            ]
        );
        assert_eq!(h.only_activity().value, Some(Sentiment::Neutral));
    }

    #[tokio::test]
    async fn test_climbing() {
        let mut h = Harness::new();
        let outputs = h.run(&["Start", "climbing", "2h", "great"]).await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How long did you climb for?",
                SENTIMENT_PROMPT,
                RECORDED
            ]
        );
        let activity = h.only_activity();
        assert_eq!(activity.activity_type, ActivityType::Climbing);
        assert_eq!(activity.duration, Duration::from_secs(7200));
    }

    #[tokio::test]
    async fn test_multiple_activities_in_one_session() {
        let mut h = Harness::new();
        let outputs = h
            .run(&["Start", "day", "GREAT", "yoga", "2h", "good", "finished"])
            .await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "How was your day?",
                RECORDED,
                "How long did you do yoga for?",
                SENTIMENT_PROMPT,
                RECORDED,
                FAREWELL
            ]
        );
        assert_eq!(h.stored().len(), 2);
    }

    // ------------------------------------------------------------------
    // Fast path
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_fast_path_climbing() {
        let mut h = Harness::new();
        h.say("start").await;
        h.extractor.queue_entities(entities(&[
            ("climbing", EntityPayload::value("true")),
            ("duration", EntityPayload::seconds(7200.0)),
        ]));

        let outputs = h.run(&["Went climbing for 2 hours", "good"]).await;
        assert_eq!(outputs, vec![SENTIMENT_PROMPT, RECORDED]);
        assert_eq!(
            h.extractor.recorded_requests(),
            vec!["Went climbing for 2 hours"]
        );

        let activity = h.only_activity();
        assert_eq!(activity.activity_type, ActivityType::Climbing);
        assert_eq!(activity.duration, Duration::from_secs(7200));
        assert_eq!(activity.value, Some(Sentiment::Good));
        assert_eq!(activity.raw_messages, "Went climbing for 2 hours\ngood");
    }

    #[tokio::test]
    async fn test_fast_path_running_partial() {
        // Distance is known, duration still has to be asked
        let mut h = Harness::new();
        h.say("start").await;
        h.extractor.queue_entities(entities(&[
            ("running", EntityPayload::value("true")),
            ("distance", EntityPayload::value(5)),
        ]));

        let outputs = h.run(&["I ran 5 miles", "40m", "ok"]).await;
        assert_eq!(
            outputs,
            vec!["How long did you run for?", SENTIMENT_PROMPT, RECORDED]
        );
        let activity = h.only_activity();
        assert_eq!(activity.count, 5);
        assert_eq!(activity.duration, Duration::from_secs(2400));
        assert_eq!(activity.raw_messages, "I ran 5 miles\n40m\nok");
    }

    #[tokio::test]
    async fn test_fast_path_uses_stated_date() {
        let mut h = Harness::new();
        h.say("start").await;
        let mut map = entities(&[
            ("yoga", EntityPayload::value("true")),
            ("duration", EntityPayload::seconds(3600.0)),
        ]);
        map.insert(
            "datetime".into(),
            vec![EntityPayload::value("2024-03-08T09:00:00.000+00:00")],
        );
        h.extractor.queue_entities(map);

        h.run(&["did an hour of yoga on friday", "great"]).await;
        assert_eq!(
            h.only_activity().utc_date,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
        );
    }

    #[tokio::test]
    async fn test_fast_and_slow_paths_converge() {
        let mut slow = Harness::new();
        slow.run(&["start", "climbing", "2h", "great"]).await;

        let mut fast = Harness::new();
        fast.say("start").await;
        fast.extractor.queue_entities(entities(&[
            ("climbing", EntityPayload::value("true")),
            ("duration", EntityPayload::seconds(7200.0)),
        ]));
        fast.run(&["climbed for two hours", "great"]).await;

        let (a, b) = (slow.only_activity(), fast.only_activity());
        assert_eq!(a.activity_type, b.activity_type);
        assert_eq!(a.utc_date, b.utc_date);
        assert_eq!(a.value, b.value);
        assert_eq!(a.count, b.count);
        assert_eq!(a.duration, b.duration);
    }

    // ------------------------------------------------------------------
    // Persistence semantics
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_same_day_updates_in_place() {
        let mut h = Harness::new();
        h.run(&["start", "day", "bad"]).await;
        let first = h.only_activity();

        h.run(&["day", "great"]).await;
        let second = h.only_activity();
        assert_eq!(second.id, first.id);
        assert_eq!(second.value, Some(Sentiment::Great));
        assert_eq!(second.raw_messages, "great");
    }

    // ------------------------------------------------------------------
    // Validation and errors
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_bad_duration_keeps_state() {
        let mut h = Harness::new();
        h.run(&["start", "yoga"]).await;

        let reply = h.say("abc").await;
        assert_eq!(reply, "Sorry, I can't understand that duration value.");
        assert_eq!(h.state().await, Some(StateType::AskingActivityDuration));

        assert_eq!(h.say("45m").await, SENTIMENT_PROMPT);
        h.say("good").await;
        assert_eq!(h.only_activity().raw_messages, "45m\ngood");
    }

    #[tokio::test]
    async fn test_unstorable_duration_is_asked_again() {
        let db = crate::db::Database::open_in_memory().unwrap();
        let engine = DialogEngine::new(
            crate::runtime::DatabaseStorage::new(db.clone()),
            MockExtractor::new(),
            SessionStore::default(),
        );
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();
        let inputs = ["start", "yoga", "3000000h"];
        let mut replies = Vec::new();
        for (i, text) in (0i64..).zip(inputs) {
            let now = start + chrono::Duration::seconds(i);
            replies.push(engine.handle_at("fb1", text, now).await);
        }
        assert_eq!(replies[2], "Sorry, I can't understand that duration value.");
        assert_eq!(
            engine.sessions().lock().await.get("fb1").map(|s| s.state),
            Some(StateType::AskingActivityDuration)
        );

        let later = start + chrono::Duration::seconds(10);
        assert_eq!(engine.handle_at("fb1", "1h", later).await, SENTIMENT_PROMPT);
        assert_eq!(engine.handle_at("fb1", "good", later).await, RECORDED);
        let user = db.provision_user("fb1", chrono_tz::UTC).unwrap();
        let stored = db.activities_for_user(user.user_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].duration, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_bad_count_and_sentiment() {
        let mut h = Harness::new();
        h.run(&["start", "laundry"]).await;

        assert_eq!(h.say("a few").await, "Sorry, I can't understand that number.");
        assert_eq!(h.state().await, Some(StateType::AskingActivityCount));

        h.say("2").await;
        let reply = h.say("whatever").await;
        assert!(reply.starts_with("Sorry, I don't understand what that means"));
        assert_eq!(h.state().await, Some(StateType::AskingActivityValue));
    }

    #[tokio::test]
    async fn test_unknown_activity_type() {
        let mut h = Harness::new();
        h.say("start").await;
        assert_eq!(h.say("swimming").await, UNKNOWN_TYPE);
        assert_eq!(h.state().await, Some(StateType::AskingActivityType));
    }

    #[tokio::test]
    async fn test_save_failure_allows_retry() {
        let mut h = Harness::new();
        h.run(&["start", "yoga", "2h"]).await;

        h.store.fail_saves(true);
        assert_eq!(
            h.say("good").await,
            "Whoops, there was a problem saving your activity, try again shortly."
        );
        assert_eq!(h.state().await, Some(StateType::AskingActivityValue));
        assert!(h.stored().is_empty());

        h.store.fail_saves(false);
        assert_eq!(h.say("good").await, RECORDED);
        assert_eq!(h.only_activity().raw_messages, "2h\ngood");
    }

    #[tokio::test]
    async fn test_extraction_failure_keeps_state() {
        let mut h = Harness::new();
        h.say("start").await;
        h.extractor.queue_error(NlpError::network("connection refused"));

        assert_eq!(
            h.say("yoga").await,
            "Sorry, there was an error parsing your message."
        );
        assert_eq!(h.state().await, Some(StateType::AskingActivityType));
        assert_eq!(h.say("yoga").await, "How long did you do yoga for?");
    }

    #[tokio::test]
    async fn test_provisioning_failure() {
        let mut h = Harness::new();
        h.store.fail_provisioning(true);
        assert_eq!(h.say("start").await, CANNOT_START);
        assert_eq!(h.engine.sessions().len().await, 0);
    }

    #[tokio::test]
    async fn test_summary_load_failure() {
        let mut h = Harness::new();
        h.say("start").await;
        h.store.fail_loads(true);
        assert_eq!(
            h.say("summary").await,
            "There was an error fetching your summary. Try again shortly."
        );
    }

    // ------------------------------------------------------------------
    // Commands, timezone, summary
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_help_and_listing_need_no_session() {
        let mut h = Harness::new();
        assert_eq!(h.say("HELP").await, HELP);
        assert_eq!(h.say("activities").await, *ACTIVITY_LISTING);
        assert_eq!(
            *ACTIVITY_LISTING,
            "Available activities are the following: \
             day, programming, laundry, running, meetings, reading, yoga, climbing"
        );
        assert_eq!(h.engine.sessions().len().await, 0);
    }

    #[tokio::test]
    async fn test_exit_discards_pending() {
        let mut h = Harness::new();
        let outputs = h.run(&["start", "reading", "12", "stop", "hi"]).await;
        assert_eq!(outputs[3], FAREWELL);
        assert_eq!(outputs[4], RETURNING_GREETING);
        assert!(h.stored().is_empty());
        assert_eq!(h.state().await, Some(StateType::AskingActivityType));
    }

    #[tokio::test]
    async fn test_set_timezone() {
        let mut h = Harness::new();
        let outputs = h
            .run(&["Start", "TIMEZONE", "America/Los_Angeles", "finished"])
            .await;
        assert_eq!(
            outputs,
            vec![
                NEW_USER_GREETING,
                "Your current timezone is UTC. What would you like to change it to?",
                TIMEZONE_SAVED,
                FAREWELL
            ]
        );
        let user_id = h.store.user_id("fb1").unwrap();
        assert_eq!(
            h.store.timezone(user_id),
            Some(chrono_tz::America::Los_Angeles)
        );
    }

    #[tokio::test]
    async fn test_invalid_timezone_keeps_asking() {
        let mut h = Harness::new();
        h.run(&["start", "timezone"]).await;
        assert_eq!(
            h.say("Moon/Base").await,
            "Sorry, I don't know what timezone that is. Please try again."
        );
        assert_eq!(h.state().await, Some(StateType::AskingTimezone));
    }

    #[tokio::test]
    async fn test_summary() {
        let mut h = Harness::new();
        assert_eq!(
            h.run(&["start", "summary"]).await[1],
            NOTHING_RECORDED.to_string()
        );

        h.run(&["climbing", "1h", "good", "day", "great"]).await;
        assert_eq!(
            h.say("summary").await,
            "Today you've recorded that:\n\
             - Your day was great.\n\
             - You climbed for 1h and felt good about it."
        );
    }

    #[tokio::test]
    async fn test_summary_uses_local_day() {
        // 03:00 UTC on the 10th is the evening of the 9th in Los Angeles
        let mut h = Harness::new().starting_at(Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap());
        h.run(&["start", "timezone", "America/Los_Angeles", "day", "great"])
            .await;

        // Recorded on the UTC day; not "today" for this user
        let user_id = h.store.user_id("fb1").unwrap();
        let mut utc_day = Activity::started(ActivityType::Yoga, h.now, chrono_tz::UTC, "1h");
        utc_day.duration = Duration::from_secs(3600);
        utc_day.value = Some(Sentiment::Good);
        h.store.upsert_activity(user_id, &utc_day).await.unwrap();

        let day = h
            .stored()
            .into_iter()
            .find(|a| a.activity_type == ActivityType::OverallDay)
            .unwrap();
        assert_eq!(day.utc_date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());

        assert_eq!(
            h.say("summary").await,
            "Today you've recorded that:\n- Your day was great."
        );
    }

    // ------------------------------------------------------------------
    // Expiry
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_expired_session_starts_over() {
        let mut h = Harness::with_timeout(Duration::from_secs(60));
        h.run(&["start", "day"]).await;
        assert_eq!(h.state().await, Some(StateType::AskingActivityValue));

        h.now += chrono::Duration::seconds(120);
        assert_eq!(h.say("great").await, RETURNING_GREETING);
        assert_eq!(h.state().await, Some(StateType::AskingActivityType));

        // The old question is gone; "great" is not an activity type
        assert_eq!(h.say("great").await, UNKNOWN_TYPE);
        assert!(h.stored().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_makes_session_unreachable() {
        let mut h = Harness::with_timeout(Duration::from_secs(60));
        h.run(&["start", "yoga"]).await;

        let later = h.now + chrono::Duration::seconds(61);
        assert_eq!(h.engine.sessions().sweep(later).await, 1);
        assert_eq!(h.state().await, None);
    }
}
