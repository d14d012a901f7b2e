use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::{ConfigFile, DiscordConfig, HeraldConfig, RelayConfig},
};

pub const TOKEN_VAR: &str = "DISCORD_API_TOKEN";
pub const GUILD_VAR: &str = "GUILD";
pub const ALLOWED_CHANNEL_VAR: &str = "ALLOWED_CHANNEL_ID";
pub const ALLOWED_ROLE_VAR: &str = "ALLOWED_ROLE_ID";
pub const SEND_PACE_VAR: &str = "HERALD_SEND_PACE_MS";
pub const SEND_TIMEOUT_VAR: &str = "HERALD_SEND_TIMEOUT_SECS";
pub const COMMAND_PREFIX_VAR: &str = "HERALD_COMMAND_PREFIX";

const CONFIG_FILENAME: &str = "herald.toml";

/// Load the process configuration.
///
/// Uses `path` when given, otherwise the first `herald.toml` found by
/// [`find_config_file`]; a missing file is fine since the environment alone
/// can carry every required value.
pub fn load(path: Option<&Path>) -> Result<HeraldConfig> {
    let file = match path {
        Some(path) => read_config_file(path)?,
        None => match find_config_file() {
            Some(found) => {
                debug!(path = %found.display(), "loading config file");
                read_config_file(&found)?
            },
            None => {
                debug!("no config file found, using environment only");
                ConfigFile::default()
            },
        },
    };
    from_sources(file, |name| std::env::var(name).ok())
}

/// Read and parse a TOML config file with `${VAR}` substitution.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    toml::from_str(&raw).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge a parsed file with environment values and validate the result.
///
/// `lookup` returns the environment value for a variable name; empty values
/// count as unset.
pub fn from_sources(
    file: ConfigFile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<HeraldConfig> {
    let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let token = match env(TOKEN_VAR) {
        Some(token) => Secret::new(token.trim().to_string()),
        None => file
            .discord
            .token
            .filter(|t| !t.expose_secret().trim().is_empty())
            .ok_or(Error::Missing { var: TOKEN_VAR })?,
    };

    let discord = DiscordConfig {
        token,
        guild_id: required_id(GUILD_VAR, env(GUILD_VAR), file.discord.guild_id)?,
        allowed_channel_id: required_id(
            ALLOWED_CHANNEL_VAR,
            env(ALLOWED_CHANNEL_VAR),
            file.discord.allowed_channel_id,
        )?,
        allowed_role_id: required_id(
            ALLOWED_ROLE_VAR,
            env(ALLOWED_ROLE_VAR),
            file.discord.allowed_role_id,
        )?,
    };

    let defaults = RelayConfig::default();
    let pace_ms = optional_u64(SEND_PACE_VAR, env(SEND_PACE_VAR))?.or(file.relay.send_pace_ms);
    let send_pace = match pace_ms {
        Some(ms) => Duration::from_millis(ms),
        None => defaults.send_pace,
    };
    let timeout_secs =
        optional_u64(SEND_TIMEOUT_VAR, env(SEND_TIMEOUT_VAR))?.or(file.relay.send_timeout_secs);
    let send_timeout = match timeout_secs {
        Some(0) => return Err(Error::invalid(SEND_TIMEOUT_VAR, "must be at least 1 second")),
        Some(secs) => Duration::from_secs(secs),
        None => defaults.send_timeout,
    };
    let command_prefix = env(COMMAND_PREFIX_VAR)
        .or(file.relay.command_prefix)
        .map(|p| p.trim().to_string())
        .unwrap_or(defaults.command_prefix);
    if command_prefix.is_empty() {
        return Err(Error::invalid(COMMAND_PREFIX_VAR, "must not be empty"));
    }

    Ok(HeraldConfig {
        discord,
        relay: RelayConfig {
            send_pace,
            send_timeout,
            command_prefix,
        },
    })
}

fn required_id(
    var: &'static str,
    env_value: Option<String>,
    file_value: Option<u64>,
) -> Result<u64> {
    let id = match env_value {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| Error::invalid(var, e))?,
        None => file_value.ok_or(Error::Missing { var })?,
    };
    if id == 0 {
        return Err(Error::invalid(var, "id must be non-zero"));
    }
    Ok(id)
}

fn optional_u64(var: &'static str, env_value: Option<String>) -> Result<Option<u64>> {
    env_value
        .map(|raw| raw.trim().parse::<u64>().map_err(|e| Error::invalid(var, e)))
        .transpose()
}

/// First `herald.toml` in the working directory, then in the user config
/// directory (`~/.config/herald/`).
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|p| p.exists())
}

/// User-global config directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "herald").map(|d| d.config_dir().to_path_buf())
}
