use std::{error::Error as StdError, time::Duration};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by platform collaborators outside of per-recipient sends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured guild is unknown to the platform or not reachable.
    #[error("guild not found")]
    GuildNotFound,

    /// A requested message does not exist or is not readable.
    #[error("message {message_id} not found in channel {channel_id}")]
    MessageNotFound { channel_id: u64, message_id: u64 },

    /// Wrapped source error from the platform client.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Why a message link could not be turned into a source message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid message link")]
    MalformedLink,
    #[error("channel {0} not found")]
    ChannelNotFound(u64),
    #[error("message {message_id} not found in channel {channel_id}")]
    MessageNotFound { channel_id: u64, message_id: u64 },
}

impl ResolveError {
    /// Text shown to the invoker.
    pub fn reply(&self) -> &'static str {
        match self {
            Self::MalformedLink => "Invalid message link",
            Self::ChannelNotFound(_) => "Channel not found",
            Self::MessageNotFound { .. } => "Failed to forward message",
        }
    }
}

/// Failure of a single direct-message send.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The recipient cannot be messaged (DMs closed, left the guild, blocked).
    #[error("recipient unreachable: {0}")]
    RecipientUnreachable(String),

    /// The platform rejected the send because of rate limiting.
    #[error("rate limited")]
    RateLimited,

    /// Network or server-side failure that might succeed later.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The send did not complete within the configured timeout.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

impl SendError {
    /// Whether a later attempt could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RecipientUnreachable(_))
    }
}
