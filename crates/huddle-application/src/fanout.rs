//! Notification fan-out.
//!
//! Given a completed domain mutation, computes the recipient set and
//! delivers through the live transport and the bot sink. Delivery runs
//! detached from the triggering request: failures are logged and swallowed,
//! each bot contact is attempted independently, and every sink call is
//! bounded by a timeout so a slow sink cannot stall the rest.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use huddle_core::channel::{Channel, ChannelRepository};
use huddle_core::notify::{BotSink, DomainEvent, LiveTransport};
use huddle_core::user::UserRepository;
use huddle_core::Result;

pub struct NotificationFanout {
    channels: Arc<dyn ChannelRepository>,
    users: Arc<dyn UserRepository>,
    live: Arc<dyn LiveTransport>,
    bot: Arc<dyn BotSink>,
    sink_timeout: Duration,
}

impl NotificationFanout {
    pub fn new(
        channels: Arc<dyn ChannelRepository>,
        users: Arc<dyn UserRepository>,
        live: Arc<dyn LiveTransport>,
        bot: Arc<dyn BotSink>,
        sink_timeout: Duration,
    ) -> Self {
        Self {
            channels,
            users,
            live,
            bot,
            sink_timeout,
        }
    }

    /// Hands an event off for background delivery. Never blocks the caller
    /// and never reports failure to it.
    pub fn spawn(self: &Arc<Self>, event: DomainEvent) {
        let fanout = Arc::clone(self);
        tokio::spawn(async move {
            fanout.dispatch(event).await;
        });
    }

    /// Delivers one event to all sinks. Infallible by contract: every
    /// failure is recovered here.
    pub async fn dispatch(&self, event: DomainEvent) {
        let channel = match self.channels.find_by_id(event.channel_id()).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                debug!(channel = event.channel_id(), "fan-out skipped, channel gone");
                return;
            }
            Err(err) => {
                warn!(channel = event.channel_id(), %err, "fan-out aborted, channel load failed");
                return;
            }
        };

        self.publish_live(&event).await;

        let contacts = match self.recipients(&channel, &event).await {
            Ok(contacts) => contacts,
            Err(err) => {
                warn!(channel = %channel.id, %err, "fan-out aborted, recipient lookup failed");
                return;
            }
        };
        if contacts.is_empty() {
            return;
        }

        let text = format_event(&event, &channel);
        for contact in &contacts {
            match timeout(self.sink_timeout, self.bot.deliver(contact, &text)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(contact, %err, "bot delivery failed"),
                Err(_) => warn!(contact, "bot delivery timed out"),
            }
        }
        debug!(channel = %channel.id, recipients = contacts.len(), "fan-out complete");
    }

    /// Live delivery is independent of the bot sink and best-effort.
    async fn publish_live(&self, event: &DomainEvent) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "event payload serialization failed");
                return;
            }
        };
        let publish = self
            .live
            .publish(event.channel_id(), event.event_name(), payload);
        match timeout(self.sink_timeout, publish).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(channel = event.channel_id(), %err, "live publish failed"),
            Err(_) => warn!(channel = event.channel_id(), "live publish timed out"),
        }
    }

    /// Deduplicated bot contact ids for a channel-scoped event.
    ///
    /// For task events the assignee's contact is unioned in first, even if
    /// the assignee is filtered out elsewhere, then deduplicated against
    /// the channel-wide set.
    async fn recipients(&self, channel: &Channel, event: &DomainEvent) -> Result<Vec<String>> {
        let mut contacts: Vec<String> = Vec::new();

        if let DomainEvent::TaskStatusChanged { task, .. } = event {
            if let Some(assignee) = &task.assignee {
                if let Some(user) = self.users.find_by_id(assignee).await? {
                    if let Some(contact) = user.bot_contact() {
                        contacts.push(contact.to_string());
                    }
                }
            }
        }

        let members = self.users.find_by_ids(&channel.member_ids()).await?;
        for member in &members {
            if let Some(contact) = member.bot_contact() {
                if !contacts.iter().any(|c| c == contact) {
                    contacts.push(contact.to_string());
                }
            }
        }
        Ok(contacts)
    }
}

/// Formats an event as a bot notification.
pub(crate) fn format_event(event: &DomainEvent, channel: &Channel) -> String {
    match event {
        DomainEvent::MessageSent {
            message,
            sender_name,
        } => format!(
            "*New message in {}*\nFrom: {}\n\n{}",
            channel.name, sender_name, message.content
        ),
        DomainEvent::TaskStatusChanged {
            task,
            previous,
            updated_by,
        } => format!(
            "*Task update in {}*\nTask: {}\nBy: {}\nStatus: {} -> {}",
            channel.name, task.title, updated_by, previous, task.status
        ),
        DomainEvent::MemberJoined {
            user_name, role, ..
        } => format!(
            "*{} joined {}* as {}",
            user_name, channel.name, role
        ),
        DomainEvent::PlanGenerated { event_type, .. } => format!(
            "*AI event plan generated for {}*\nEvent type: {}\nOpen the channel board to review it.",
            channel.name,
            event_type.as_str()
        ),
    }
}
