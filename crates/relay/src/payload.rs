/// Someone who receives a direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: u64,
    /// Display name, used only when reporting failures.
    pub name: String,
}

impl Recipient {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Mention markup (`<@id>`) for replies to the invoker.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A guild member as listed by a [`MemberDirectory`](crate::MemberDirectory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMember {
    pub id: u64,
    /// Account username; the legacy text command matches against it.
    pub name: String,
    pub roles: Vec<u64>,
}

impl GuildMember {
    pub fn has_role(&self, role_id: u64) -> bool {
        self.roles.contains(&role_id)
    }

    pub fn to_recipient(&self) -> Recipient {
        Recipient::new(self.id, self.name.clone())
    }
}

/// A rich content block (a Discord embed) stripped down to what can be
/// re-sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichBlock {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub colour: Option<u32>,
    pub timestamp: Option<String>,
    pub author: Option<RichAuthor>,
    pub footer: Option<RichFooter>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub fields: Vec<RichField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// One outgoing direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Rich(RichBlock),
    /// Link to an attachment of the source message, sent as plain content.
    Attachment(String),
}

/// A message fetched from a guild channel, ready to be forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMessage {
    pub content: String,
    pub rich_blocks: Vec<RichBlock>,
    pub attachment_urls: Vec<String>,
}

/// The ordered sub-messages delivered to every recipient of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedContent {
    parts: Vec<Payload>,
}

impl ForwardedContent {
    /// A single plain-text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Payload::Text(text.into())],
        }
    }

    /// Forwarding plan for a fetched message: its first rich block, then its
    /// text when non-empty, then one message per attachment link.
    ///
    /// Only the first rich block is carried over.
    pub fn from_source(source: &SourceMessage) -> Self {
        let mut parts = Vec::with_capacity(2 + source.attachment_urls.len());
        if let Some(block) = source.rich_blocks.first() {
            parts.push(Payload::Rich(block.clone()));
        }
        if !source.content.is_empty() {
            parts.push(Payload::Text(source.content.clone()));
        }
        parts.extend(source.attachment_urls.iter().cloned().map(Payload::Attachment));
        Self { parts }
    }

    pub fn parts(&self) -> &[Payload] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
