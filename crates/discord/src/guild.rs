//! Relay platform traits implemented over the Discord HTTP API.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    serenity::{
        Error as SerenityError,
        all::{
            Channel, ChannelId, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage,
            Embed, GuildId, Message, MessageId, Timestamp, UserId,
        },
        http::{Http, HttpError},
    },
    tracing::{debug, warn},
};

use herald_relay::{
    GuildMember, MemberDirectory, MessageStore, Payload, Recipient, RecipientSender, RichBlock,
    SendError, SourceMessage,
    payload::{RichAuthor, RichField, RichFooter},
};

/// Largest page the member list endpoint returns.
const MEMBER_PAGE_SIZE: u64 = 1000;

/// Discord JSON error codes for a recipient that cannot receive DMs.
const CANNOT_MESSAGE_USER: i64 = 50007;
const UNKNOWN_USER: i64 = 10013;
const UNKNOWN_MEMBER: i64 = 10007;
const UNKNOWN_GUILD: i64 = 10004;

/// The configured guild, seen through the HTTP client.
///
/// DM channels opened during the lifetime of one value are remembered so a
/// multi-part forward opens each channel once.
pub struct DiscordGuild {
    http: Arc<Http>,
    guild_id: GuildId,
    dm_channels: Mutex<HashMap<UserId, ChannelId>>,
}

impl DiscordGuild {
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self {
            http,
            guild_id,
            dm_channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    async fn dm_channel(&self, user_id: UserId) -> Result<ChannelId, SendError> {
        if let Some(channel_id) = self.cached_dm_channel(user_id) {
            return Ok(channel_id);
        }

        let channel = user_id
            .create_dm_channel(&self.http)
            .await
            .map_err(|e| classify_send_error(&e))?;

        self.remember_dm_channel(user_id, channel.id);
        Ok(channel.id)
    }

    /// A poisoned cache is bypassed; every send then opens its DM channel.
    fn cached_dm_channel(&self, user_id: UserId) -> Option<ChannelId> {
        match self.dm_channels.lock() {
            Ok(channels) => channels.get(&user_id).copied(),
            Err(e) => {
                warn!(user_id = user_id.get(), error = %e, "dm channel cache lock poisoned");
                None
            },
        }
    }

    fn remember_dm_channel(&self, user_id: UserId, channel_id: ChannelId) {
        match self.dm_channels.lock() {
            Ok(mut channels) => {
                channels.insert(user_id, channel_id);
            },
            Err(e) => {
                warn!(user_id = user_id.get(), error = %e, "dm channel cache lock poisoned");
            },
        }
    }
}

#[async_trait]
impl RecipientSender for DiscordGuild {
    async fn send(&self, recipient: &Recipient, payload: &Payload) -> Result<(), SendError> {
        if recipient.id == 0 {
            return Err(SendError::RecipientUnreachable("invalid user id".into()));
        }

        let channel_id = self.dm_channel(UserId::new(recipient.id)).await?;
        channel_id
            .send_message(&self.http, build_message(payload))
            .await
            .map_err(|e| classify_send_error(&e))?;

        debug!(recipient_id = recipient.id, "direct message sent");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for DiscordGuild {
    async fn has_channel(&self, channel_id: u64) -> herald_relay::Result<bool> {
        if channel_id == 0 {
            return Ok(false);
        }

        match self.http.get_channel(ChannelId::new(channel_id)).await {
            Ok(Channel::Guild(channel)) => Ok(channel.guild_id == self.guild_id),
            Ok(_) => Ok(false),
            Err(e) if matches!(http_status(&e), Some(403 | 404)) => Ok(false),
            Err(e) => Err(herald_relay::Error::external("fetch channel", e)),
        }
    }

    async fn fetch_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> herald_relay::Result<SourceMessage> {
        if channel_id == 0 || message_id == 0 {
            return Err(herald_relay::Error::MessageNotFound {
                channel_id,
                message_id,
            });
        }

        let message = self
            .http
            .get_message(ChannelId::new(channel_id), MessageId::new(message_id))
            .await
            .map_err(|e| match http_status(&e) {
                Some(403 | 404) => herald_relay::Error::MessageNotFound {
                    channel_id,
                    message_id,
                },
                _ => herald_relay::Error::external("fetch message", e),
            })?;

        Ok(source_message(&message))
    }
}

#[async_trait]
impl MemberDirectory for DiscordGuild {
    async fn members(&self) -> herald_relay::Result<Vec<GuildMember>> {
        let mut members = Vec::new();
        let mut after: Option<UserId> = None;

        loop {
            let page = self
                .guild_id
                .members(&self.http, Some(MEMBER_PAGE_SIZE), after)
                .await
                .map_err(|e| {
                    if http_status(&e) == Some(404) || json_code(&e) == Some(UNKNOWN_GUILD) {
                        herald_relay::Error::GuildNotFound
                    } else {
                        herald_relay::Error::external("list guild members", e)
                    }
                })?;

            let fetched = page.len() as u64;
            after = page.last().map(|m| m.user.id);
            members.extend(page.into_iter().map(|m| GuildMember {
                id: m.user.id.get(),
                name: m.user.name,
                roles: m.roles.iter().map(|r| r.get()).collect(),
            }));

            if fetched < MEMBER_PAGE_SIZE {
                break;
            }
        }

        debug!(guild_id = self.guild_id.get(), count = members.len(), "guild members listed");
        Ok(members)
    }
}

fn http_status(error: &SerenityError) -> Option<u16> {
    match error {
        SerenityError::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.status_code.as_u16())
        },
        _ => None,
    }
}

fn json_code(error: &SerenityError) -> Option<i64> {
    match error {
        SerenityError::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.error.code as i64)
        },
        _ => None,
    }
}

/// Map a serenity failure of a DM send onto the relay's send error.
pub(crate) fn classify_send_error(error: &SerenityError) -> SendError {
    match error {
        SerenityError::Http(HttpError::UnsuccessfulRequest(response)) => classify_status(
            response.status_code.as_u16(),
            response.error.code as i64,
            &response.error.message,
        ),
        other => {
            warn!(error = %other, "direct message transport failure");
            SendError::Transient(other.to_string())
        },
    }
}

/// Classify an unsuccessful Discord API response.
pub(crate) fn classify_status(status: u16, code: i64, message: &str) -> SendError {
    match (status, code) {
        (429, _) => SendError::RateLimited,
        (403, _) | (_, CANNOT_MESSAGE_USER | UNKNOWN_USER | UNKNOWN_MEMBER) => {
            SendError::RecipientUnreachable(format!("{status} {code}: {message}"))
        },
        _ => SendError::Transient(format!("{status} {code}: {message}")),
    }
}

pub(crate) fn build_message(payload: &Payload) -> CreateMessage {
    match payload {
        Payload::Text(text) => CreateMessage::new().content(text),
        Payload::Rich(block) => CreateMessage::new().embed(build_embed(block)),
        Payload::Attachment(url) => CreateMessage::new().content(url),
    }
}

pub(crate) fn build_embed(block: &RichBlock) -> CreateEmbed {
    let mut embed = CreateEmbed::new();

    if let Some(title) = &block.title {
        embed = embed.title(title);
    }
    if let Some(description) = &block.description {
        embed = embed.description(description);
    }
    if let Some(url) = &block.url {
        embed = embed.url(url);
    }
    if let Some(colour) = block.colour {
        embed = embed.colour(colour);
    }
    if let Some(timestamp) = &block.timestamp {
        match Timestamp::parse(timestamp) {
            Ok(ts) => embed = embed.timestamp(ts),
            Err(e) => debug!(timestamp, error = %e, "dropping unparseable embed timestamp"),
        }
    }
    if let Some(author) = &block.author {
        let mut builder = CreateEmbedAuthor::new(&author.name);
        if let Some(url) = &author.url {
            builder = builder.url(url);
        }
        if let Some(icon_url) = &author.icon_url {
            builder = builder.icon_url(icon_url);
        }
        embed = embed.author(builder);
    }
    if let Some(footer) = &block.footer {
        let mut builder = CreateEmbedFooter::new(&footer.text);
        if let Some(icon_url) = &footer.icon_url {
            builder = builder.icon_url(icon_url);
        }
        embed = embed.footer(builder);
    }
    if let Some(image_url) = &block.image_url {
        embed = embed.image(image_url);
    }
    if let Some(thumbnail_url) = &block.thumbnail_url {
        embed = embed.thumbnail(thumbnail_url);
    }
    for field in &block.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }

    embed
}

pub(crate) fn rich_block(embed: &Embed) -> RichBlock {
    RichBlock {
        title: embed.title.clone(),
        description: embed.description.clone(),
        url: embed.url.clone(),
        colour: embed.colour.map(|c| c.0),
        timestamp: embed.timestamp.as_ref().map(ToString::to_string),
        author: embed.author.as_ref().map(|a| RichAuthor {
            name: a.name.clone(),
            url: a.url.clone(),
            icon_url: a.icon_url.clone(),
        }),
        footer: embed.footer.as_ref().map(|f| RichFooter {
            text: f.text.clone(),
            icon_url: f.icon_url.clone(),
        }),
        image_url: embed.image.as_ref().map(|i| i.url.clone()),
        thumbnail_url: embed.thumbnail.as_ref().map(|t| t.url.clone()),
        fields: embed
            .fields
            .iter()
            .map(|f| RichField {
                name: f.name.clone(),
                value: f.value.clone(),
                inline: f.inline,
            })
            .collect(),
    }
}

pub(crate) fn source_message(message: &Message) -> SourceMessage {
    SourceMessage {
        content: message.content.clone(),
        rich_blocks: message.embeds.iter().map(rich_block).collect(),
        attachment_urls: message.attachments.iter().map(|a| a.url.clone()).collect(),
    }
}
