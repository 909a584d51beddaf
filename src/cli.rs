// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use speededitor::WheelMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "speededitor")]
#[command(author, version, about = "Blackmagic DaVinci Resolve Speed Editor driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/speededitor/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// hidraw path of the device (overrides the config file)
    #[arg(long, global = true, value_name = "HIDRAW")]
    pub path: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print key, wheel and session events until Ctrl-C or disconnect
    #[command(visible_aliases = ["mon", "m"])]
    Monitor {
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Run the authentication handshake once
    Auth,

    /// Set a key LED
    Led {
        /// Key name (see `keys`), e.g. CAM1 or smooth-cut style names
        key: String,
        action: LedAction,
    },

    /// Select the wheel mode
    Mode {
        /// jog, shuttle or scroll
        mode: WheelMode,
    },

    /// List keys with codes and LED positions
    Keys,

    /// Compute the host response to a challenge (no device needed)
    Response {
        /// Challenge as 8 bytes of hex in wire order, e.g. 00112233aabbccdd
        challenge: String,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedAction {
    On,
    Off,
    Toggle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_led() {
        let cli = Cli::try_parse_from(["speededitor", "led", "cam1", "toggle"]).unwrap();
        match cli.command {
            Commands::Led { key, action } => {
                assert_eq!(key, "cam1");
                assert_eq!(action, LedAction::Toggle);
            }
            _ => panic!("Expected led command"),
        }
    }

    #[test]
    fn test_parse_mode() {
        let cli = Cli::try_parse_from(["speededitor", "mode", "shuttle"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Mode {
                mode: WheelMode::Shuttle
            }
        ));
        assert!(Cli::try_parse_from(["speededitor", "mode", "spin"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "speededitor",
            "monitor",
            "--json",
            "--path",
            "/dev/hidraw4",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Monitor { json: true }));
        assert_eq!(cli.path.as_deref(), Some("/dev/hidraw4"));
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_monitor_alias() {
        let cli = Cli::try_parse_from(["speededitor", "mon"]).unwrap();
        assert!(matches!(cli.command, Commands::Monitor { json: false }));
    }
}
