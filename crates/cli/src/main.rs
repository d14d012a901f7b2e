mod config_commands;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "herald", about = "Herald, relays direct messages to Discord users and roles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (defaults to ./herald.toml, then the user config dir).
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve commands (default when no subcommand is provided).
    Run,
    /// Validate the configuration and exit.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "herald starting");
            let config =
                herald_config::load(cli.config.as_deref()).context("failed to load configuration")?;
            herald_discord::run(&config).await?;
        },
        Some(Commands::Check) => config_commands::check(cli.config.as_deref())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_is_the_default_command() {
        let cli = Cli::parse_from(["herald", "--json-logs"]);
        assert!(cli.command.is_none());
        assert!(cli.json_logs);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn check_accepts_config_path() {
        let cli = Cli::parse_from(["herald", "check", "--config", "/etc/herald.toml"]);
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/herald.toml")));
    }
}
