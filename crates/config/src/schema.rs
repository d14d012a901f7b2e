use std::time::Duration;

use {
    secrecy::Secret,
    serde::Deserialize,
};

/// Default wait between two recipients of a fan-out.
pub const DEFAULT_SEND_PACE_MS: u64 = 500;

/// Default upper bound for a single direct-message send.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

/// Default prefix for text commands (`!send ...`).
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Fully validated process configuration. Built once at startup.
#[derive(Clone, Debug)]
pub struct HeraldConfig {
    pub discord: DiscordConfig,
    pub relay: RelayConfig,
}

/// Discord credentials and the permission policy ids.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token from the developer portal.
    pub token: Secret<String>,
    /// Guild the bot serves; slash commands are registered here.
    pub guild_id: u64,
    /// Only invocations from this channel are accepted.
    pub allowed_channel_id: u64,
    /// Invokers must hold this role.
    pub allowed_role_id: u64,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("guild_id", &self.guild_id)
            .field("allowed_channel_id", &self.allowed_channel_id)
            .field("allowed_role_id", &self.allowed_role_id)
            .finish()
    }
}

/// Fan-out tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub send_pace: Duration,
    pub send_timeout: Duration,
    pub command_prefix: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            send_pace: Duration::from_millis(DEFAULT_SEND_PACE_MS),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
        }
    }
}

/// On-disk shape of `herald.toml`. Every key is optional; the environment
/// fills in or overrides values before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub discord: DiscordFileSection,
    pub relay: RelayFileSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscordFileSection {
    pub token: Option<Secret<String>>,
    pub guild_id: Option<u64>,
    pub allowed_channel_id: Option<u64>,
    pub allowed_role_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayFileSection {
    pub send_pace_ms: Option<u64>,
    pub send_timeout_secs: Option<u64>,
    pub command_prefix: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn relay_defaults() {
        let relay = RelayConfig::default();
        assert_eq!(relay.send_pace, Duration::from_millis(500));
        assert_eq!(relay.send_timeout, Duration::from_secs(10));
        assert_eq!(relay.command_prefix, "!");
    }

    #[test]
    fn deserialize_partial_file() {
        let raw = r#"
            [discord]
            token = "abc.def"
            guild_id = 42

            [relay]
            send_pace_ms = 1000
        "#;
        let file: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(
            file.discord.token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("abc.def")
        );
        assert_eq!(file.discord.guild_id, Some(42));
        assert_eq!(file.discord.allowed_role_id, None);
        assert_eq!(file.relay.send_pace_ms, Some(1000));
        assert_eq!(file.relay.command_prefix, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let raw = "[relay]\nsend_pace = 3\n";
        assert!(toml::from_str::<ConfigFile>(raw).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = DiscordConfig {
            token: Secret::new("super-secret".into()),
            guild_id: 1,
            allowed_channel_id: 2,
            allowed_role_id: 3,
        };
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("super-secret"));
    }
}
