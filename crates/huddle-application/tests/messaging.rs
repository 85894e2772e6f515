//! Messaging, fan-out, and AI auto-response scenarios.

mod support;

use std::sync::Arc;
use std::time::Duration;

use huddle_application::{NewChannel, NotificationFanout};
use huddle_core::access::ChannelRole;
use huddle_core::error::HuddleError;
use huddle_core::message::{MessageKind, MessageRepository};
use huddle_core::notify::DomainEvent;
use support::{RecordingBotSink, RecordingLiveTransport, StubAiResponder, TestEngine, wait_for};

async fn engine_with_channel(engine: &TestEngine) -> (String, String) {
    let alice = engine.add_user("alice", Some("tg-alice")).await;
    let channel = engine
        .coordinator
        .create_channel(
            &alice.id,
            NewChannel {
                name: "launch".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    (alice.id, channel.id)
}

#[tokio::test]
async fn send_message_persists_and_publishes_live() {
    let engine = TestEngine::new();
    let (alice, channel_id) = engine_with_channel(&engine).await;

    let sent = engine
        .coordinator
        .send_message(&channel_id, &alice, "venue booked, all good", MessageKind::Text)
        .await
        .unwrap();
    assert_eq!(sent.sender.as_deref(), Some(alice.as_str()));
    assert!(!sent.is_ai);

    let listed = engine
        .coordinator
        .list_messages(&channel_id, &alice, None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "venue booked, all good");

    let live = engine.live.clone();
    assert!(
        wait_for(|| {
            let live = live.clone();
            async move { live.event_names().contains(&"message:new".to_string()) }
        })
        .await
    );
}

#[tokio::test]
async fn empty_messages_and_non_members_are_rejected() {
    let engine = TestEngine::new();
    let (alice, channel_id) = engine_with_channel(&engine).await;
    let mallory = engine.add_user("mallory", None).await;

    let err = engine
        .coordinator
        .send_message(&channel_id, &mallory.id, "let me in", MessageKind::Text)
        .await
        .unwrap_err();
    assert!(matches!(err, HuddleError::AccessDenied));

    let err = engine
        .coordinator
        .list_messages(&channel_id, &mallory.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HuddleError::AccessDenied));

    let err = engine
        .coordinator
        .send_message(&channel_id, &alice, "", MessageKind::Text)
        .await
        .unwrap_err();
    assert!(matches!(err, HuddleError::InvalidOperation(_)));
}

#[tokio::test]
async fn list_messages_caps_at_the_limit_in_chronological_order() {
    let engine = TestEngine::new();
    let (alice, channel_id) = engine_with_channel(&engine).await;

    for text in ["first", "second", "third"] {
        engine
            .coordinator
            .send_message(&channel_id, &alice, text, MessageKind::Text)
            .await
            .unwrap();
    }

    let listed = engine
        .coordinator
        .list_messages(&channel_id, &alice, Some(2))
        .await
        .unwrap();
    let texts: Vec<&str> = listed.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(texts, vec!["second", "third"]);
}

#[tokio::test]
async fn one_failing_contact_does_not_block_the_rest() {
    let engine = TestEngine::new();
    let alice = engine.add_user("alice", Some("c1")).await;
    let bea = engine.add_user("bea", Some("c2")).await;
    let carol = engine.add_user("carol", Some("c3")).await;
    engine.bot.fail_for("c2");

    let channel = engine
        .coordinator
        .create_channel(
            &alice.id,
            NewChannel {
                name: "picnic".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    for invitee in [&bea, &carol] {
        engine
            .coordinator
            .invite(&channel.id, &alice.id, &invitee.email, ChannelRole::Volunteer)
            .await
            .unwrap();
        engine
            .coordinator
            .accept_invitation(&channel.id, &invitee.id)
            .await
            .unwrap();
    }

    // Drive one delivery synchronously so the assertion is deterministic.
    let fanout = NotificationFanout::new(
        engine.store.clone(),
        engine.store.clone(),
        engine.live.clone(),
        engine.bot.clone(),
        Duration::from_millis(500),
    );
    let message = engine
        .coordinator
        .send_message(&channel.id, &alice.id, "tables are set", MessageKind::Text)
        .await
        .unwrap();
    fanout
        .dispatch(DomainEvent::MessageSent {
            message,
            sender_name: "alice".to_string(),
        })
        .await;

    let delivered = engine.bot.delivered_to();
    assert!(delivered.contains(&"c1".to_string()));
    assert!(delivered.contains(&"c3".to_string()));
    assert!(!delivered.contains(&"c2".to_string()));
    // The failing contact was still attempted.
    assert!(engine.bot.attempts.lock().unwrap().contains(&"c2".to_string()));
}

#[tokio::test]
async fn task_events_reach_the_assignee_exactly_once() {
    let engine = TestEngine::new();
    let alice = engine.add_user("alice", Some("c1")).await;
    let bea = engine.add_user("bea", Some("c2")).await;

    let channel = engine
        .coordinator
        .create_channel(
            &alice.id,
            NewChannel {
                name: "cleanup".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine
        .coordinator
        .invite(&channel.id, &alice.id, &bea.email, ChannelRole::Volunteer)
        .await
        .unwrap();
    engine
        .coordinator
        .accept_invitation(&channel.id, &bea.id)
        .await
        .unwrap();

    let task = engine
        .coordinator
        .create_task(
            &alice.id,
            huddle_core::task::NewTask {
                channel_id: channel.id.clone(),
                title: "stack chairs".to_string(),
                assignee: Some(bea.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let fanout = NotificationFanout::new(
        engine.store.clone(),
        engine.store.clone(),
        engine.live.clone(),
        engine.bot.clone(),
        Duration::from_millis(500),
    );
    fanout
        .dispatch(DomainEvent::TaskStatusChanged {
            task,
            previous: huddle_core::task::TaskStatus::Todo,
            updated_by: "alice".to_string(),
        })
        .await;

    // The assignee is a member too; the union is deduplicated.
    let to_bea = engine
        .bot
        .delivered_to()
        .iter()
        .filter(|c| c.as_str() == "c2")
        .count();
    assert_eq!(to_bea, 1);
    assert!(engine.bot.delivered_to().contains(&"c1".to_string()));
}

#[tokio::test]
async fn a_hanging_contact_is_abandoned_after_its_timeout() {
    let engine = TestEngine::new();
    let alice = engine.add_user("alice", Some("c1")).await;
    let bea = engine.add_user("bea", Some("c2")).await;
    let carol = engine.add_user("carol", Some("c3")).await;
    engine.bot.hang_for("c2");

    let channel = engine
        .coordinator
        .create_channel(
            &alice.id,
            NewChannel {
                name: "parade".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    for invitee in [&bea, &carol] {
        engine
            .coordinator
            .invite(&channel.id, &alice.id, &invitee.email, ChannelRole::Volunteer)
            .await
            .unwrap();
        engine
            .coordinator
            .accept_invitation(&channel.id, &invitee.id)
            .await
            .unwrap();
    }

    let fanout = NotificationFanout::new(
        engine.store.clone(),
        engine.store.clone(),
        engine.live.clone(),
        engine.bot.clone(),
        Duration::from_millis(100),
    );
    let message = engine
        .coordinator
        .send_message(&channel.id, &alice.id, "floats line up at noon", MessageKind::Text)
        .await
        .unwrap();
    fanout
        .dispatch(DomainEvent::MessageSent {
            message,
            sender_name: "alice".to_string(),
        })
        .await;

    // The stalled delivery is abandoned at its own timeout; the contacts
    // after it are still served.
    let delivered = engine.bot.delivered_to();
    assert!(delivered.contains(&"c1".to_string()));
    assert!(delivered.contains(&"c3".to_string()));
    assert!(!delivered.contains(&"c2".to_string()));
    assert!(engine.bot.attempts.lock().unwrap().contains(&"c2".to_string()));
}

#[tokio::test]
async fn a_hanging_responder_never_stalls_the_send() {
    let engine = TestEngine::with_ai(StubAiResponder {
        reply: Some("late answer".to_string()),
        delay: Some(Duration::from_secs(60)),
        ..Default::default()
    });
    let (alice, channel_id) = engine_with_channel(&engine).await;

    let started = std::time::Instant::now();
    engine
        .coordinator
        .send_message(&channel_id, &alice, "how to rig the stage?", MessageKind::Text)
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(400));

    // The responder was invoked, then abandoned at the timeout; its late
    // reply never lands.
    let ai = engine.ai.clone();
    assert!(
        wait_for(|| {
            let ai = ai.clone();
            async move { !ai.prompts.lock().unwrap().is_empty() }
        })
        .await
    );
    tokio::time::sleep(Duration::from_millis(700)).await;
    let messages = MessageRepository::list_by_channel(engine.store.as_ref(), &channel_id, 100)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].is_ai);
}

#[tokio::test]
async fn reactions_and_read_receipts_persist_for_members_only() {
    let engine = TestEngine::new();
    let (alice, channel_id) = engine_with_channel(&engine).await;
    let mallory = engine.add_user("mallory", None).await;
    let message = engine
        .coordinator
        .send_message(&channel_id, &alice, "group photo at five", MessageKind::Text)
        .await
        .unwrap();

    let err = engine
        .coordinator
        .add_reaction(&message.id, &mallory.id, "👍")
        .await
        .unwrap_err();
    assert!(matches!(err, HuddleError::AccessDenied));
    let err = engine
        .coordinator
        .mark_message_read(&message.id, &mallory.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HuddleError::AccessDenied));

    let updated = engine
        .coordinator
        .add_reaction(&message.id, &alice, "🎉")
        .await
        .unwrap();
    assert_eq!(updated.reactions.len(), 1);

    engine
        .coordinator
        .mark_message_read(&message.id, &alice)
        .await
        .unwrap();
    let updated = engine
        .coordinator
        .mark_message_read(&message.id, &alice)
        .await
        .unwrap();
    assert_eq!(updated.read_by.len(), 1);

    let stored = MessageRepository::find_by_id(engine.store.as_ref(), &message.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.reactions[0].emoji, "🎉");
    assert_eq!(stored.read_by[0].user_id, alice);
}

#[tokio::test]
async fn questions_get_an_ai_reply_persisted_in_the_channel() {
    let engine = TestEngine::with_ai(StubAiResponder {
        reply: Some("Start with the caterer.".to_string()),
        ..Default::default()
    });
    let (alice, channel_id) = engine_with_channel(&engine).await;

    engine
        .coordinator
        .send_message(&channel_id, &alice, "how to plan catering?", MessageKind::Text)
        .await
        .unwrap();

    let store = engine.store.clone();
    let channel = channel_id.clone();
    assert!(
        wait_for(|| {
            let store = store.clone();
            let channel = channel.clone();
            async move {
                MessageRepository::list_by_channel(store.as_ref(), &channel, 100)
                    .await
                    .unwrap()
                    .iter()
                    .any(|m| m.is_ai)
            }
        })
        .await
    );

    let messages = MessageRepository::list_by_channel(engine.store.as_ref(), &channel_id, 100)
        .await
        .unwrap();
    let reply = messages.iter().find(|m| m.is_ai).unwrap();
    assert_eq!(reply.kind, MessageKind::AiResponse);
    assert!(reply.sender.is_none());
    assert_eq!(reply.content, "Start with the caterer.");
    assert_eq!(
        reply
            .metadata
            .as_ref()
            .and_then(|m| m.action_type.as_deref()),
        Some("auto-response")
    );
}

#[tokio::test]
async fn statements_do_not_trigger_the_responder() {
    let engine = TestEngine::with_ai(StubAiResponder {
        reply: Some("unused".to_string()),
        ..Default::default()
    });
    let (alice, channel_id) = engine_with_channel(&engine).await;

    engine
        .coordinator
        .send_message(&channel_id, &alice, "venue booked, all good", MessageKind::Text)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(engine.ai.prompts.lock().unwrap().is_empty());
    let messages = MessageRepository::list_by_channel(engine.store.as_ref(), &channel_id, 100)
        .await
        .unwrap();
    assert!(messages.iter().all(|m| !m.is_ai));
}

#[tokio::test]
async fn a_failing_responder_never_fails_the_send() {
    // Default stub has no canned reply, so the responder errors.
    let engine = TestEngine::new();
    let (alice, channel_id) = engine_with_channel(&engine).await;

    engine
        .coordinator
        .send_message(&channel_id, &alice, "who can help with badges?", MessageKind::Text)
        .await
        .unwrap();

    // The prompt was attempted, but no AI message ever lands.
    let ai = engine.ai.clone();
    assert!(
        wait_for(|| {
            let ai = ai.clone();
            async move { !ai.prompts.lock().unwrap().is_empty() }
        })
        .await
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    let messages = MessageRepository::list_by_channel(engine.store.as_ref(), &channel_id, 100)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].is_ai);
}

#[tokio::test]
async fn fan_out_skips_channels_that_disappeared() {
    let engine = TestEngine::new();
    let (alice, channel_id) = engine_with_channel(&engine).await;
    let message = engine
        .coordinator
        .send_message(&channel_id, &alice, "last words", MessageKind::Text)
        .await
        .unwrap();
    engine
        .coordinator
        .delete_channel(&channel_id, &alice)
        .await
        .unwrap();

    let bot: Arc<RecordingBotSink> = Arc::new(RecordingBotSink::default());
    let live = Arc::new(RecordingLiveTransport::default());
    let fanout = NotificationFanout::new(
        engine.store.clone(),
        engine.store.clone(),
        live.clone(),
        bot.clone(),
        Duration::from_millis(500),
    );
    fanout
        .dispatch(DomainEvent::MessageSent {
            message,
            sender_name: "alice".to_string(),
        })
        .await;

    assert!(bot.delivered_to().is_empty());
    assert!(live.event_names().is_empty());
}
