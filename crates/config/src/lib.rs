//! Configuration loading for herald.
//!
//! Required values come from the environment (`DISCORD_API_TOKEN`, `GUILD`,
//! `ALLOWED_CHANNEL_ID`, `ALLOWED_ROLE_ID`). An optional `herald.toml` can
//! carry the same keys plus relay tuning; `${ENV_VAR}` placeholders in the
//! file are substituted and environment values always win.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{config_dir, find_config_file, from_sources, load, read_config_file},
    schema::{
        ConfigFile, DiscordConfig, DiscordFileSection, HeraldConfig, RelayConfig, RelayFileSection,
    },
};
