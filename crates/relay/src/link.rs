use tracing::{debug, warn};

use crate::{error::ResolveError, payload::SourceMessage, platform::MessageStore};

/// Canonical links look like
/// `https://discord.com/channels/<guild>/<channel>/<message>`.
const MIN_LINK_SEGMENTS: usize = 7;

/// Channel and message ids extracted from a message link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLinkRef {
    pub channel_id: u64,
    pub message_id: u64,
}

impl MessageLinkRef {
    /// Parse the last two `/`-separated segments of `link` as channel and
    /// message id.
    pub fn parse(link: &str) -> Result<Self, ResolveError> {
        let segments: Vec<&str> = link.trim().split('/').collect();
        if segments.len() < MIN_LINK_SEGMENTS {
            return Err(ResolveError::MalformedLink);
        }
        let [.., channel, message] = segments.as_slice() else {
            return Err(ResolveError::MalformedLink);
        };
        Ok(Self {
            channel_id: parse_id(channel)?,
            message_id: parse_id(message)?,
        })
    }
}

fn parse_id(segment: &str) -> Result<u64, ResolveError> {
    match segment.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ResolveError::MalformedLink),
        Ok(id) => Ok(id),
    }
}

/// Turns message links into fetched source messages.
pub struct LinkResolver;

impl LinkResolver {
    pub async fn resolve(
        link: &str,
        store: &dyn MessageStore,
    ) -> Result<SourceMessage, ResolveError> {
        let link_ref = MessageLinkRef::parse(link)?;
        let MessageLinkRef {
            channel_id,
            message_id,
        } = link_ref;

        match store.has_channel(channel_id).await {
            Ok(true) => {},
            Ok(false) => return Err(ResolveError::ChannelNotFound(channel_id)),
            Err(e) => {
                warn!(channel_id, error = %e, "channel lookup failed");
                return Err(ResolveError::ChannelNotFound(channel_id));
            },
        }

        match store.fetch_message(channel_id, message_id).await {
            Ok(message) => {
                debug!(
                    channel_id,
                    message_id,
                    rich_blocks = message.rich_blocks.len(),
                    attachments = message.attachment_urls.len(),
                    "resolved message link"
                );
                Ok(message)
            },
            Err(e) => {
                warn!(channel_id, message_id, error = %e, "message fetch failed");
                Err(ResolveError::MessageNotFound {
                    channel_id,
                    message_id,
                })
            },
        }
    }
}
