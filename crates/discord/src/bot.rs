use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    serenity::{Client, all::GuildId},
    tracing::{info, warn},
};

use {
    herald_config::HeraldConfig,
    herald_relay::{FanoutDispatcher, PermissionPolicy, Relay},
};

use crate::{Result, handler::HeraldHandler};

/// Build the relay described by `config`.
pub fn build_relay(config: &HeraldConfig) -> Relay {
    let policy = PermissionPolicy::new(
        config.discord.allowed_channel_id,
        config.discord.allowed_role_id,
    );
    let dispatcher = FanoutDispatcher::new(config.relay.send_pace, config.relay.send_timeout);
    Relay::new(policy, dispatcher)
}

/// Connect to the gateway and serve commands until the process is interrupted
/// or the connection fails.
pub async fn run(config: &HeraldConfig) -> Result<()> {
    let guild_id = GuildId::new(config.discord.guild_id);
    let handler = HeraldHandler::new(
        guild_id,
        Arc::new(build_relay(config)),
        config.relay.command_prefix.clone(),
    );

    let mut client = Client::builder(
        config.discord.token.expose_secret(),
        HeraldHandler::intents(),
    )
    .event_handler(handler)
    .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested, closing gateway connection");
                shard_manager.shutdown_all().await;
            },
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    info!(guild_id = guild_id.get(), "connecting to discord gateway");
    client.start().await?;
    info!("discord client stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use {
        super::*,
        herald_config::{DiscordConfig, RelayConfig},
        herald_relay::{Actor, AuthzResult, authorize},
        secrecy::Secret,
    };

    #[test]
    fn relay_uses_configured_policy_and_pacing() {
        let config = HeraldConfig {
            discord: DiscordConfig {
                token: Secret::new("token".into()),
                guild_id: 1,
                allowed_channel_id: 10,
                allowed_role_id: 20,
            },
            relay: RelayConfig {
                send_pace: Duration::from_millis(250),
                send_timeout: Duration::from_secs(3),
                command_prefix: "?".into(),
            },
        };

        let relay = build_relay(&config);
        assert_eq!(relay.dispatcher().pace(), Duration::from_millis(250));
        assert_eq!(relay.dispatcher().send_timeout(), Duration::from_secs(3));
        assert_eq!(
            authorize(&Actor::new(5, 10, vec![20]), relay.policy()),
            AuthzResult::Allowed
        );
        assert_eq!(
            authorize(&Actor::new(5, 11, vec![20]), relay.policy()),
            AuthzResult::DeniedWrongChannel
        );
    }
}
