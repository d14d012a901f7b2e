//! Discord front-end for herald, built on serenity.
//!
//! Registers the relay slash commands on the configured guild, handles the
//! `!send` text command, and implements the relay platform traits over the
//! Discord HTTP API.

pub mod bot;
pub mod commands;
pub mod error;
pub mod guild;
pub mod handler;

pub use {
    bot::run,
    error::{Error, Result},
    guild::DiscordGuild,
    handler::HeraldHandler,
};
