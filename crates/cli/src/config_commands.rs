use std::path::Path;

use {anyhow::Result, herald_config::HeraldConfig};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Validate the configuration without connecting and print what was loaded.
pub fn check(path: Option<&Path>) -> Result<()> {
    match path.map(Path::to_path_buf).or_else(herald_config::find_config_file) {
        Some(found) => eprintln!("Checking {} and the environment\n", found.display()),
        None => eprintln!("No config file found; checking the environment only.\n"),
    }

    match herald_config::load(path) {
        Ok(config) => {
            for line in summary(&config) {
                eprintln!("  {line}");
            }
            eprintln!("\n{GREEN}{BOLD}ok{RESET}: configuration is valid");
            Ok(())
        },
        Err(e) => {
            eprintln!("{RED}{BOLD}error{RESET}: {e}");
            anyhow::bail!("configuration is invalid")
        },
    }
}

fn summary(config: &HeraldConfig) -> Vec<String> {
    vec![
        "token: [REDACTED]".to_string(),
        format!("guild: {}", config.discord.guild_id),
        format!("allowed channel: {}", config.discord.allowed_channel_id),
        format!("allowed role: {}", config.discord.allowed_role_id),
        format!("send pace: {}ms", config.relay.send_pace.as_millis()),
        format!("send timeout: {}s", config.relay.send_timeout.as_secs()),
        format!("command prefix: {}", config.relay.command_prefix),
    ]
}
