//! Discord event handler for serenity.
//!
//! Registers the slash commands once the gateway is ready, turns command
//! interactions and `!send` messages into relay calls, and posts the replies.

use std::sync::Arc;

use {
    serenity::{
        all::{
            CommandInteraction, Context, CreateInteractionResponseFollowup, EventHandler,
            GatewayIntents, GuildId, Interaction, Message, Ready,
        },
        async_trait,
    },
    tracing::{debug, info, warn},
};

use herald_relay::{Actor, Platform, Relay, legacy::command_argument};

use crate::{
    commands::{self, SlashCommand},
    guild::DiscordGuild,
};

/// Longest message content Discord accepts.
const MAX_REPLY_LEN: usize = 2000;

const INVALID_ARGUMENTS_REPLY: &str = "Invalid command arguments.";

/// Handler for Discord gateway events.
pub struct HeraldHandler {
    guild_id: GuildId,
    relay: Arc<Relay>,
    command_prefix: String,
}

impl HeraldHandler {
    pub fn new(guild_id: GuildId, relay: Arc<Relay>, command_prefix: impl Into<String>) -> Self {
        Self {
            guild_id,
            relay,
            command_prefix: command_prefix.into(),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn guild(&self, ctx: &Context) -> DiscordGuild {
        DiscordGuild::new(Arc::clone(&ctx.http), self.guild_id)
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        if let Err(e) = command.defer_ephemeral(&ctx.http).await {
            warn!(command = %command.data.name, error = %e, "failed to defer interaction");
            return;
        }

        let reply = match SlashCommand::from_interaction(command) {
            Ok(slash) => {
                info!(
                    command = slash.name(),
                    user_id = command.user.id.get(),
                    channel_id = command.channel_id.get(),
                    "running slash command"
                );
                let guild = self.guild(ctx);
                let actor = command_actor(command);
                slash
                    .run(&self.relay, &actor, Platform::from_guild(&guild))
                    .await
            },
            Err(e) => {
                warn!(command = %command.data.name, error = %e, "invalid slash command invocation");
                INVALID_ARGUMENTS_REPLY.to_string()
            },
        };

        let followup = CreateInteractionResponseFollowup::new()
            .content(truncate_reply(&reply))
            .ephemeral(true);
        if let Err(e) = command.create_followup(&ctx.http, followup).await {
            warn!(command = %command.data.name, error = %e, "failed to send command reply");
        }
    }
}

#[async_trait]
impl EventHandler for HeraldHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guild_id = self.guild_id.get(),
            guilds = ready.guilds.len(),
            "discord bot ready"
        );

        match self
            .guild_id
            .set_commands(&ctx.http, commands::definitions())
            .await
        {
            Ok(registered) => info!(count = registered.len(), "slash commands registered"),
            Err(e) => warn!(error = %e, "failed to register slash commands"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.handle_command(&ctx, &command).await;
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages to prevent loops
        if msg.author.bot {
            return;
        }

        let Some(args) = command_argument(&msg.content, &self.command_prefix, "send") else {
            return;
        };
        debug!(
            user_id = msg.author.id.get(),
            channel_id = msg.channel_id.get(),
            "legacy send command received"
        );

        let guild = self.guild(&ctx);
        let actor = message_actor(&msg);
        let reply = self
            .relay
            .legacy_send(&actor, args, Platform::from_guild(&guild))
            .await;

        if let Err(e) = msg.channel_id.say(&ctx.http, truncate_reply(&reply)).await {
            warn!(channel_id = msg.channel_id.get(), error = %e, "failed to send command reply");
        }
    }
}

/// The invoker of a slash command; roles are only known for guild members.
fn command_actor(command: &CommandInteraction) -> Actor {
    let user_id = command.user.id.get();
    let channel_id = command.channel_id.get();
    match &command.member {
        Some(member) => Actor::new(
            user_id,
            channel_id,
            member.roles.iter().map(|r| r.get()).collect(),
        ),
        None => Actor::unresolved(user_id, channel_id),
    }
}

fn message_actor(msg: &Message) -> Actor {
    let user_id = msg.author.id.get();
    let channel_id = msg.channel_id.get();
    match (&msg.member, msg.guild_id) {
        (Some(member), Some(_)) => Actor::new(
            user_id,
            channel_id,
            member.roles.iter().map(|r| r.get()).collect(),
        ),
        _ => Actor::unresolved(user_id, channel_id),
    }
}

/// Cut `text` to Discord's content limit on a char boundary.
fn truncate_reply(text: &str) -> String {
    if text.len() <= MAX_REPLY_LEN {
        return text.to_string();
    }
    let mut end = MAX_REPLY_LEN - 3;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_include_members_and_content() {
        let intents = HeraldHandler::intents();
        assert!(intents.contains(GatewayIntents::GUILD_MEMBERS));
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(!intents.contains(GatewayIntents::DIRECT_MESSAGES));
    }

    #[test]
    fn short_replies_are_untouched() {
        assert_eq!(truncate_reply("Sent to 3/3 members"), "Sent to 3/3 members");
    }

    #[test]
    fn long_replies_fit_the_limit() {
        let failed: Vec<String> = (0..400).map(|i| format!("member{i}")).collect();
        let reply = format!("Sent to 0/400 members\nFailed: {}", failed.join(", "));

        let truncated = truncate_reply(&reply);
        assert_eq!(truncated.len(), MAX_REPLY_LEN);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let reply = "é".repeat(1500);
        let truncated = truncate_reply(&reply);
        assert!(truncated.len() <= MAX_REPLY_LEN);
        assert!(truncated.ends_with("..."));
    }
}
