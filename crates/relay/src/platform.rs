use async_trait::async_trait;

use crate::{
    Result,
    error::SendError,
    payload::{GuildMember, Payload, Recipient, SourceMessage},
};

/// Delivers one direct message to one recipient.
#[async_trait]
pub trait RecipientSender: Send + Sync {
    async fn send(
        &self,
        recipient: &Recipient,
        payload: &Payload,
    ) -> std::result::Result<(), SendError>;
}

/// Read access to the messages of the served guild.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Whether `channel_id` is a channel of the served guild.
    async fn has_channel(&self, channel_id: u64) -> Result<bool>;

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Result<SourceMessage>;
}

/// Lists the members of the served guild.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Every current member, in the platform's enumeration order.
    async fn members(&self) -> Result<Vec<GuildMember>>;

    /// Members holding `role_id`, in enumeration order.
    async fn role_members(&self, role_id: u64) -> Result<Vec<Recipient>> {
        Ok(self
            .members()
            .await?
            .iter()
            .filter(|m| m.has_role(role_id))
            .map(GuildMember::to_recipient)
            .collect())
    }
}

/// The platform collaborators one command invocation works against.
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    pub sender: &'a dyn RecipientSender,
    pub store: &'a dyn MessageStore,
    pub directory: &'a dyn MemberDirectory,
}

impl<'a> Platform<'a> {
    /// Use a single value that implements every collaborator trait.
    pub fn from_guild<G>(guild: &'a G) -> Self
    where
        G: RecipientSender + MessageStore + MemberDirectory,
    {
        Self {
            sender: guild,
            store: guild,
            directory: guild,
        }
    }
}
