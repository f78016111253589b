//! Pieces shared by the reclight binaries.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use reclight_core::{ConfigManager, Settings, DEFAULT_CHANNEL, DEFAULT_PORT};

/// UDP port and OSC address, identical on both ends of the link.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// UDP port of the controller
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// OSC address carrying the MIDI messages
    #[arg(long = "osc_channel", default_value = DEFAULT_CHANNEL)]
    pub osc_channel: String,
}

/// `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Settings from `path`, or the built-in defaults without one.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    let mut manager = ConfigManager::new(path.to_path_buf());
    let settings = manager
        .load()
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    log::info!("Loaded config from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        link: LinkArgs,
    }

    #[test]
    fn test_link_defaults() {
        let cli = Cli::parse_from(["test"]);
        assert_eq!(cli.link.port, 5005);
        assert_eq!(cli.link.osc_channel, "/midi");

        let cli = Cli::parse_from(["test", "--port", "6000", "--osc_channel", "/daw"]);
        assert_eq!(cli.link.port, 6000);
        assert_eq!(cli.link.osc_channel, "/daw");
    }

    #[test]
    fn test_no_config_means_defaults() {
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }
}
