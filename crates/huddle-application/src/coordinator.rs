//! Channel aggregate coordinator.
//!
//! Top-level orchestration: validates callers through access control,
//! mutates the aggregates through the membership and task services,
//! persists the change, then hands the resulting event to notification
//! fan-out. Message-creation events may additionally trigger the AI
//! responder, whose reply re-enters the pipeline as a synthetic
//! AI-authored message.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, warn};

use huddle_core::access::{self, ChannelRole};
use huddle_core::channel::{
    AiContext, AiPlan, Channel, ChannelRepository, ChannelStatus, EventType, Invitation,
    InvitationSummary, MembershipService,
};
use huddle_core::error::{HuddleError, Result};
use huddle_core::message::{Message, MessageKind, MessageMetadata, MessageRepository};
use huddle_core::notify::{AiResponder, BotSink, DomainEvent, LiveTransport};
use huddle_core::task::{NewTask, Task, TaskBoard, TaskComment, TaskRepository, TaskService, TaskStatus};
use huddle_core::user::{User, UserRepository};

use crate::fanout::NotificationFanout;

/// Display name attached to AI-authored messages in notifications.
const AI_SENDER_NAME: &str = "AI Assistant";

/// Tuning knobs for the coordinator's external calls.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound on one AI responder call.
    pub ai_timeout: Duration,
    /// Upper bound on one live/bot sink call during fan-out.
    pub sink_timeout: Duration,
    /// Default cap on message-history reads.
    pub message_history_limit: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ai_timeout: Duration::from_secs(10),
            sink_timeout: Duration::from_secs(5),
            message_history_limit: 100,
        }
    }
}

/// Input for channel creation.
#[derive(Debug, Clone, Default)]
pub struct NewChannel {
    pub name: String,
    pub description: String,
    pub event_type: EventType,
    pub ai_context: Option<AiContext>,
}

/// A channel's tasks, flat and grouped for the kanban consumer.
#[derive(Debug, Clone)]
pub struct ChannelTasks {
    pub tasks: Vec<Task>,
    pub board: TaskBoard,
}

pub struct ChannelCoordinator {
    users: Arc<dyn UserRepository>,
    channels: Arc<dyn ChannelRepository>,
    tasks: Arc<dyn TaskRepository>,
    messages: Arc<dyn MessageRepository>,
    ai: Arc<dyn AiResponder>,
    membership: MembershipService,
    task_lifecycle: TaskService,
    fanout: Arc<NotificationFanout>,
    config: CoordinatorConfig,
}

impl ChannelCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        channels: Arc<dyn ChannelRepository>,
        tasks: Arc<dyn TaskRepository>,
        messages: Arc<dyn MessageRepository>,
        live: Arc<dyn LiveTransport>,
        bot: Arc<dyn BotSink>,
        ai: Arc<dyn AiResponder>,
        config: CoordinatorConfig,
    ) -> Self {
        let membership = MembershipService::new(
            Arc::clone(&channels),
            Arc::clone(&users),
            Default::default(),
        );
        let task_lifecycle = TaskService::new(Arc::clone(&tasks), Arc::clone(&channels));
        let fanout = Arc::new(NotificationFanout::new(
            Arc::clone(&channels),
            Arc::clone(&users),
            live,
            bot,
            config.sink_timeout,
        ));
        Self {
            users,
            channels,
            tasks,
            messages,
            ai,
            membership,
            task_lifecycle,
            fanout,
            config,
        }
    }

    async fn require_user(&self, user_id: &str) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| HuddleError::not_found("user", user_id))
    }

    async fn require_channel(&self, channel_id: &str) -> Result<Channel> {
        self.channels
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| HuddleError::not_found("channel", channel_id))
    }

    async fn require_message(&self, message_id: &str) -> Result<Message> {
        self.messages
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| HuddleError::not_found("message", message_id))
    }

    // ============================================================================
    // Channels
    // ============================================================================

    /// Creates a channel with a single admin membership for the owner.
    ///
    /// When the AI context carries any populated field, a welcome message
    /// summarizing it is persisted best-effort: a failure there never rolls
    /// back channel creation.
    pub async fn create_channel(&self, owner_id: &str, input: NewChannel) -> Result<Channel> {
        if input.name.is_empty() {
            return Err(HuddleError::invalid_operation("channel name is required"));
        }
        let owner = self.require_user(owner_id).await?;
        if !owner.permissions.can_create_channels {
            return Err(HuddleError::forbidden("channel creation is disabled for this user"));
        }

        let ai_context = input.ai_context.filter(|ctx| !ctx.is_empty());
        let channel = Channel::new(
            &owner.id,
            input.name,
            input.description,
            input.event_type,
            ai_context.clone(),
        );
        self.channels.insert(&channel).await?;
        info!(channel = %channel.id, owner = owner_id, "channel created");

        if let Some(ctx) = ai_context {
            let welcome = Message::system(&channel.id, welcome_summary(&channel.name, &ctx));
            if let Err(err) = self.messages.insert(&welcome).await {
                warn!(channel = %channel.id, %err, "welcome message not persisted");
            }
        }
        Ok(channel)
    }

    /// Fetches one channel; membership required.
    pub async fn get_channel(&self, channel_id: &str, requester_id: &str) -> Result<Channel> {
        let requester = self.require_user(requester_id).await?;
        let channel = self.require_channel(channel_id).await?;
        access::resolve_role(&requester, &channel)?;
        Ok(channel)
    }

    /// Channels where the caller is the admin or a member.
    pub async fn my_channels(&self, requester_id: &str) -> Result<Vec<Channel>> {
        let requester = self.require_user(requester_id).await?;
        self.channels.list_for_user(&requester.id).await
    }

    /// Moves a channel through its lifecycle; organizers and up.
    pub async fn set_channel_status(
        &self,
        channel_id: &str,
        requester_id: &str,
        status: ChannelStatus,
    ) -> Result<Channel> {
        let requester = self.require_user(requester_id).await?;
        let channel = self.require_channel(channel_id).await?;
        let role = access::resolve_role(&requester, &channel)?;
        self.membership
            .hierarchy()
            .require_minimum(role, ChannelRole::Organizer)?;

        self.channels
            .update(channel_id, &mut |ch: &mut Channel| {
                ch.status = status;
                Ok(())
            })
            .await
    }

    /// Deletes a channel and everything scoped to it.
    ///
    /// The cascade is not transactional; tasks and messages go first and
    /// the channel document last, so an interrupted cascade leaves the
    /// channel discoverable and the delete re-runnable.
    pub async fn delete_channel(&self, channel_id: &str, requester_id: &str) -> Result<()> {
        let requester = self.require_user(requester_id).await?;
        let channel = self.require_channel(channel_id).await?;
        if access::resolve_role(&requester, &channel)? != ChannelRole::Admin {
            return Err(HuddleError::forbidden("only the channel admin can delete the channel"));
        }

        let tasks_removed = self.tasks.delete_by_channel(channel_id).await?;
        let messages_removed = self.messages.delete_by_channel(channel_id).await?;
        self.channels.delete(channel_id).await?;
        info!(
            channel = channel_id,
            tasks_removed, messages_removed, "channel deleted"
        );
        Ok(())
    }

    // ============================================================================
    // Membership & invitations
    // ============================================================================

    pub async fn invite(
        &self,
        channel_id: &str,
        requester_id: &str,
        email: &str,
        role: ChannelRole,
    ) -> Result<Invitation> {
        let requester = self.require_user(requester_id).await?;
        self.membership.invite(channel_id, &requester, email, role).await
    }

    /// Accepts the caller's pending invitation and fans out the join.
    pub async fn accept_invitation(&self, channel_id: &str, requester_id: &str) -> Result<Channel> {
        let requester = self.require_user(requester_id).await?;
        let (channel, role) = self.membership.accept_invitation(channel_id, &requester).await?;

        self.fanout.spawn(DomainEvent::MemberJoined {
            channel_id: channel.id.clone(),
            user_id: requester.id.clone(),
            user_name: requester.name.clone(),
            role,
        });
        Ok(channel)
    }

    pub async fn decline_invitation(&self, channel_id: &str, requester_id: &str) -> Result<()> {
        let requester = self.require_user(requester_id).await?;
        self.membership.decline_invitation(channel_id, &requester).await
    }

    pub async fn pending_invitations(&self, requester_id: &str) -> Result<Vec<InvitationSummary>> {
        let requester = self.require_user(requester_id).await?;
        self.membership.pending_invitations(&requester).await
    }

    pub async fn remove_member(
        &self,
        channel_id: &str,
        requester_id: &str,
        target_user_id: &str,
    ) -> Result<Channel> {
        let requester = self.require_user(requester_id).await?;
        self.membership
            .remove_member(channel_id, &requester, target_user_id)
            .await
    }

    // ============================================================================
    // Tasks
    // ============================================================================

    pub async fn create_task(&self, requester_id: &str, input: NewTask) -> Result<Task> {
        let requester = self.require_user(requester_id).await?;
        self.task_lifecycle.create(&requester, input).await
    }

    pub async fn channel_tasks(
        &self,
        channel_id: &str,
        requester_id: &str,
    ) -> Result<ChannelTasks> {
        let requester = self.require_user(requester_id).await?;
        let tasks = self.task_lifecycle.list_by_channel(channel_id, &requester).await?;
        let board = TaskBoard::group(&tasks);
        Ok(ChannelTasks { tasks, board })
    }

    pub async fn my_tasks(&self, requester_id: &str) -> Result<Vec<Task>> {
        let requester = self.require_user(requester_id).await?;
        self.task_lifecycle.list_by_assignee(&requester).await
    }

    /// Moves a task between statuses and fans out the change with the
    /// old/new pair.
    pub async fn update_task_status(
        &self,
        task_id: &str,
        requester_id: &str,
        new_status: TaskStatus,
    ) -> Result<Task> {
        let requester = self.require_user(requester_id).await?;
        let (task, previous) = self
            .task_lifecycle
            .update_status(task_id, &requester, new_status)
            .await?;

        self.fanout.spawn(DomainEvent::TaskStatusChanged {
            task: task.clone(),
            previous,
            updated_by: requester.name.clone(),
        });
        Ok(task)
    }

    pub async fn add_comment(
        &self,
        task_id: &str,
        requester_id: &str,
        text: &str,
    ) -> Result<TaskComment> {
        let requester = self.require_user(requester_id).await?;
        self.task_lifecycle.add_comment(task_id, &requester, text).await
    }

    // ============================================================================
    // Messages
    // ============================================================================

    /// The most recent messages of a channel, chronological; membership
    /// required.
    pub async fn list_messages(
        &self,
        channel_id: &str,
        requester_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>> {
        let requester = self.require_user(requester_id).await?;
        let channel = self.require_channel(channel_id).await?;
        access::resolve_role(&requester, &channel)?;
        self.messages
            .list_by_channel(channel_id, limit.unwrap_or(self.config.message_history_limit))
            .await
    }

    /// Persists a message, fans it out, and optionally triggers the AI
    /// auto-response.
    ///
    /// The send succeeds as soon as the message is stored: fan-out and the
    /// AI reply run detached and their failures are swallowed.
    pub async fn send_message(
        &self,
        channel_id: &str,
        sender_id: &str,
        content: &str,
        kind: MessageKind,
    ) -> Result<Message> {
        if content.is_empty() {
            return Err(HuddleError::invalid_operation("message content is required"));
        }
        let sender = self.require_user(sender_id).await?;
        let channel = self.require_channel(channel_id).await?;
        access::resolve_role(&sender, &channel)?;

        let message = Message::from_user(channel_id, &sender.id, content, kind);
        self.messages.insert(&message).await?;

        self.fanout.spawn(DomainEvent::MessageSent {
            message: message.clone(),
            sender_name: sender.name.clone(),
        });

        if kind == MessageKind::Text && should_trigger_ai(content) {
            self.spawn_ai_response(channel, content.to_string());
        }
        Ok(message)
    }

    /// Adds an emoji reaction to a message; membership required.
    pub async fn add_reaction(
        &self,
        message_id: &str,
        requester_id: &str,
        emoji: &str,
    ) -> Result<Message> {
        let requester = self.require_user(requester_id).await?;
        let mut message = self.require_message(message_id).await?;
        let channel = self.require_channel(&message.channel_id).await?;
        access::resolve_role(&requester, &channel)?;

        message.add_reaction(&requester.id, emoji);
        self.messages.save(&message).await?;
        Ok(message)
    }

    /// Records the caller's read receipt on a message; idempotent per user,
    /// membership required.
    pub async fn mark_message_read(
        &self,
        message_id: &str,
        requester_id: &str,
    ) -> Result<Message> {
        let requester = self.require_user(requester_id).await?;
        let mut message = self.require_message(message_id).await?;
        let channel = self.require_channel(&message.channel_id).await?;
        access::resolve_role(&requester, &channel)?;

        message.mark_read(&requester.id);
        self.messages.save(&message).await?;
        Ok(message)
    }

    /// Invokes the AI responder in the background; the reply re-enters the
    /// pipeline as an AI-authored message. Any failure is swallowed.
    fn spawn_ai_response(&self, channel: Channel, prompt: String) {
        let ai = Arc::clone(&self.ai);
        let messages = Arc::clone(&self.messages);
        let fanout = Arc::clone(&self.fanout);
        let ai_timeout = self.config.ai_timeout;

        tokio::spawn(async move {
            let reply = match timeout(ai_timeout, ai.complete(&prompt, channel.ai_context.as_ref()))
                .await
            {
                Ok(Ok(reply)) => reply,
                Ok(Err(err)) => {
                    warn!(channel = %channel.id, %err, "ai responder failed");
                    return;
                }
                Err(_) => {
                    warn!(channel = %channel.id, "ai responder timed out");
                    return;
                }
            };

            let metadata = MessageMetadata {
                action_type: Some("auto-response".to_string()),
                ..Default::default()
            };
            let message = Message::ai(&channel.id, reply, Some(metadata));
            if let Err(err) = messages.insert(&message).await {
                warn!(channel = %channel.id, %err, "ai reply not persisted");
                return;
            }
            fanout.spawn(DomainEvent::MessageSent {
                message,
                sender_name: AI_SENDER_NAME.to_string(),
            });
        });
    }

    // ============================================================================
    // AI planning
    // ============================================================================

    /// Generates and stores a structured event plan.
    ///
    /// Unlike fan-out, the responder call is the primary effect here, so a
    /// failure or timeout surfaces as `ExternalSink`.
    pub async fn generate_plan(
        &self,
        channel_id: &str,
        requester_id: &str,
        event_details: serde_json::Value,
    ) -> Result<AiPlan> {
        let requester = self.require_user(requester_id).await?;
        let channel = self.require_channel(channel_id).await?;
        access::resolve_role(&requester, &channel)?;

        let action_plan = match timeout(
            self.config.ai_timeout,
            self.ai.structured_plan(&event_details),
        )
        .await
        {
            Ok(Ok(plan)) => plan,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(HuddleError::external_sink("ai", "plan generation timed out"));
            }
        };

        let plan = AiPlan {
            event_details,
            action_plan,
            generated_at: Utc::now(),
        };
        let stored = plan.clone();
        self.channels
            .update(channel_id, &mut |ch: &mut Channel| {
                ch.ai_plan = Some(stored.clone());
                Ok(())
            })
            .await?;

        let metadata = MessageMetadata {
            action_type: Some("event-plan".to_string()),
            ..Default::default()
        };
        let summary = Message::ai(
            channel_id,
            format!(
                "AI event plan generated for {} ({}). Open the channel board to review it.",
                channel.name,
                channel.event_type.as_str()
            ),
            Some(metadata),
        );
        if let Err(err) = self.messages.insert(&summary).await {
            warn!(channel = channel_id, %err, "plan summary message not persisted");
        }

        self.fanout.spawn(DomainEvent::PlanGenerated {
            channel_id: channel_id.to_string(),
            event_type: channel.event_type,
        });
        Ok(plan)
    }
}

/// Heuristic for the AI auto-response: questions and assistance keywords.
fn should_trigger_ai(content: &str) -> bool {
    if content.contains('?') {
        return true;
    }
    let lower = content.to_lowercase();
    ["task", "how to", "role", "assign", "timeline", "schedule", "help"]
        .iter()
        .any(|kw| lower.contains(kw))
}

fn welcome_summary(channel_name: &str, ctx: &AiContext) -> String {
    let mut lines = vec![format!("Welcome to {channel_name}! Planning context:")];
    let mut push = |label: &str, value: &Option<String>| {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("{label}: {v}"));
        }
    };
    push("Objective", &ctx.objective);
    push("Target audience", &ctx.target_audience);
    push("Budget", &ctx.budget);
    push("Timeline", &ctx.timeline);
    push("Challenges", &ctx.challenges);
    lines.join("\n")
}
