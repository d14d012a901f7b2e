//! Platform-neutral core of the herald relay bot.
//!
//! The permission gate, message-link resolution and the paced fan-out
//! dispatcher live here, together with the [`Relay`] command surface that
//! strings them together. Chat-platform access goes through the traits in
//! [`platform`] so everything in this crate runs against in-memory fakes.

pub mod error;
pub mod fanout;
pub mod gating;
pub mod legacy;
pub mod link;
pub mod payload;
pub mod platform;
pub mod service;

pub use {
    error::{Error, ResolveError, Result, SendError},
    fanout::{DispatchResult, FanoutDispatcher},
    gating::{Actor, AuthzResult, PermissionPolicy, authorize},
    link::{LinkResolver, MessageLinkRef},
    payload::{ForwardedContent, GuildMember, Payload, Recipient, RichBlock, SourceMessage},
    platform::{MemberDirectory, MessageStore, Platform, RecipientSender},
    service::Relay,
};
