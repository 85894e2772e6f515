//! Shared test harness: in-memory store wired to recording fake sinks.
#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use huddle_application::{ChannelCoordinator, CoordinatorConfig};
use huddle_core::channel::AiContext;
use huddle_core::error::{HuddleError, Result};
use huddle_core::notify::{AiResponder, BotSink, LiveTransport};
use huddle_core::user::User;
use huddle_core::user::UserRepository;
use huddle_infrastructure::InMemoryStore;

/// Bot sink that records deliveries; configured contacts can fail
/// immediately or hang far past any delivery timeout.
#[derive(Default)]
pub struct RecordingBotSink {
    pub sent: Mutex<Vec<(String, String)>>,
    pub attempts: Mutex<Vec<String>>,
    pub fail_contacts: Mutex<HashSet<String>>,
    pub hang_contacts: Mutex<HashSet<String>>,
}

impl RecordingBotSink {
    pub fn fail_for(&self, contact: &str) {
        self.fail_contacts.lock().unwrap().insert(contact.to_string());
    }

    pub fn hang_for(&self, contact: &str) {
        self.hang_contacts.lock().unwrap().insert(contact.to_string());
    }

    pub fn delivered_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl BotSink for RecordingBotSink {
    async fn deliver(&self, contact_id: &str, text: &str) -> Result<()> {
        self.attempts.lock().unwrap().push(contact_id.to_string());
        let hangs = self.hang_contacts.lock().unwrap().contains(contact_id);
        if hangs {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.fail_contacts.lock().unwrap().contains(contact_id) {
            return Err(HuddleError::external_sink("bot", "simulated failure"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((contact_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Live transport that records published events.
#[derive(Default)]
pub struct RecordingLiveTransport {
    pub events: Mutex<Vec<(String, String, Value)>>,
}

impl RecordingLiveTransport {
    pub fn event_names(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(_, e, _)| e.clone()).collect()
    }
}

#[async_trait]
impl LiveTransport for RecordingLiveTransport {
    async fn join_room(&self, _room_id: &str, _client_id: &str) -> Result<()> {
        Ok(())
    }

    async fn leave_room(&self, _room_id: &str, _client_id: &str) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, room_id: &str, event: &str, payload: Value) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((room_id.to_string(), event.to_string(), payload));
        Ok(())
    }
}

/// Responder stub: canned reply/plan, or failure when unset. An optional
/// delay makes every call hang that long before answering.
#[derive(Default)]
pub struct StubAiResponder {
    pub reply: Option<String>,
    pub plan: Option<Value>,
    pub delay: Option<Duration>,
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl AiResponder for StubAiResponder {
    async fn complete(&self, prompt: &str, _context: Option<&AiContext>) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply
            .clone()
            .ok_or_else(|| HuddleError::external_sink("ai", "simulated failure"))
    }

    async fn structured_plan(&self, _event_details: &Value) -> Result<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.plan
            .clone()
            .ok_or_else(|| HuddleError::external_sink("ai", "simulated failure"))
    }
}

pub struct TestEngine {
    pub store: Arc<InMemoryStore>,
    pub bot: Arc<RecordingBotSink>,
    pub live: Arc<RecordingLiveTransport>,
    pub ai: Arc<StubAiResponder>,
    pub coordinator: ChannelCoordinator,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_ai(StubAiResponder::default())
    }

    pub fn with_ai(ai: StubAiResponder) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let bot = Arc::new(RecordingBotSink::default());
        let live = Arc::new(RecordingLiveTransport::default());
        let ai = Arc::new(ai);
        let config = CoordinatorConfig {
            ai_timeout: Duration::from_millis(500),
            sink_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let coordinator = ChannelCoordinator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            live.clone(),
            bot.clone(),
            ai.clone(),
            config,
        );
        Self {
            store,
            bot,
            live,
            ai,
            coordinator,
        }
    }

    /// Registers a user, optionally with a bot contact id.
    pub async fn add_user(&self, name: &str, contact: Option<&str>) -> User {
        let mut user = User::new(
            format!("google-{name}"),
            format!("{name}@x.com"),
            name,
        );
        user.bot_contact_id = contact.map(str::to_string);
        self.store.save(&user).await.unwrap();
        user
    }

    /// Re-reads a stored user by id.
    pub async fn store_user(&self, user_id: &str) -> User {
        UserRepository::find_by_id(self.store.as_ref(), user_id)
            .await
            .unwrap()
            .unwrap()
    }
}

/// Polls an async condition until it holds or a second has passed.
pub async fn wait_for<F, Fut>(check: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check().await
}
