//! Slash command definitions and option parsing.

use serenity::all::{
    CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption,
    ResolvedValue,
};

use herald_relay::{Actor, Platform, Recipient, Relay};

use crate::error::{Error, Result};

pub const SEND_TO_USER: &str = "send_to_user";
pub const SEND_TO_ROLE: &str = "send_to_role";
pub const FORWARD_TO_USER: &str = "forward_to_user";
pub const FORWARD_TO_ROLE: &str = "forward_to_role";

/// Commands registered on the served guild.
pub fn definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(SEND_TO_USER)
            .description("Send a direct message to a user")
            .add_option(user_option())
            .add_option(message_option()),
        CreateCommand::new(SEND_TO_ROLE)
            .description("Send a direct message to every member of a role")
            .add_option(role_option())
            .add_option(message_option()),
        CreateCommand::new(FORWARD_TO_USER)
            .description("Forward a message to a user")
            .add_option(user_option())
            .add_option(link_option()),
        CreateCommand::new(FORWARD_TO_ROLE)
            .description("Forward a message to every member of a role")
            .add_option(role_option())
            .add_option(link_option()),
    ]
}

fn user_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::User, "user", "The user to message")
        .required(true)
}

fn role_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Role, "role", "The role whose members to message")
        .required(true)
}

fn message_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "message", "The message to send")
        .required(true)
}

fn link_option() -> CreateCommandOption {
    CreateCommandOption::new(
        CommandOptionType::String,
        "message_link",
        "Link to the message to forward",
    )
    .required(true)
}

/// A parsed slash command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    SendToUser { user: Recipient, message: String },
    SendToRole { role_id: u64, message: String },
    ForwardToUser { user: Recipient, message_link: String },
    ForwardToRole { role_id: u64, message_link: String },
}

impl SlashCommand {
    pub fn from_interaction(command: &CommandInteraction) -> Result<Self> {
        Self::from_options(&command.data.name, &command.data.options())
    }

    pub fn from_options(name: &str, options: &[ResolvedOption<'_>]) -> Result<Self> {
        match name {
            SEND_TO_USER => Ok(Self::SendToUser {
                user: user_value(options)?,
                message: string_value(options, "message")?,
            }),
            SEND_TO_ROLE => Ok(Self::SendToRole {
                role_id: role_value(options)?,
                message: string_value(options, "message")?,
            }),
            FORWARD_TO_USER => Ok(Self::ForwardToUser {
                user: user_value(options)?,
                message_link: string_value(options, "message_link")?,
            }),
            FORWARD_TO_ROLE => Ok(Self::ForwardToRole {
                role_id: role_value(options)?,
                message_link: string_value(options, "message_link")?,
            }),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SendToUser { .. } => SEND_TO_USER,
            Self::SendToRole { .. } => SEND_TO_ROLE,
            Self::ForwardToUser { .. } => FORWARD_TO_USER,
            Self::ForwardToRole { .. } => FORWARD_TO_ROLE,
        }
    }

    /// Run the command through the relay and return the reply text.
    pub async fn run(&self, relay: &Relay, actor: &Actor, platform: Platform<'_>) -> String {
        match self {
            Self::SendToUser { user, message } => {
                relay.send_to_user(actor, user, message, platform).await
            },
            Self::SendToRole { role_id, message } => {
                relay.send_to_role(actor, *role_id, message, platform).await
            },
            Self::ForwardToUser { user, message_link } => {
                relay.forward_to_user(actor, user, message_link, platform).await
            },
            Self::ForwardToRole {
                role_id,
                message_link,
            } => {
                relay
                    .forward_to_role(actor, *role_id, message_link, platform)
                    .await
            },
        }
    }
}

fn string_value(options: &[ResolvedOption<'_>], name: &'static str) -> Result<String> {
    options
        .iter()
        .find_map(|option| match &option.value {
            ResolvedValue::String(value) if option.name == name => Some((*value).to_string()),
            _ => None,
        })
        .ok_or(Error::MissingOption(name))
}

fn user_value(options: &[ResolvedOption<'_>]) -> Result<Recipient> {
    options
        .iter()
        .find_map(|option| match &option.value {
            ResolvedValue::User(user, _) if option.name == "user" => {
                Some(Recipient::new(user.id.get(), user.name.clone()))
            },
            _ => None,
        })
        .ok_or(Error::MissingOption("user"))
}

fn role_value(options: &[ResolvedOption<'_>]) -> Result<u64> {
    options
        .iter()
        .find_map(|option| match &option.value {
            ResolvedValue::Role(role) if option.name == "role" => Some(role.id.get()),
            _ => None,
        })
        .ok_or(Error::MissingOption("role"))
}
