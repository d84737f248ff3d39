use crate::core::ConfigProvider;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "vaheat")]
#[command(about = "Interactive prompt for the VAHEAT heating controller")]
pub struct CliConfig {
    /// Serial port, e.g. COM3 or /dev/ttyACM0. Auto-detected when omitted
    #[arg(short, long)]
    pub port: Option<String>,

    /// 9600, 14400, 19200, 38400, 57600, 115200, 230400, 460800, 921600
    #[arg(short, long)]
    pub baud_rate: Option<u32>,

    /// Read timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Show the raw text exchanged with the device after each command
    #[arg(long)]
    pub raw: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    fn open_retries(&self) -> Option<u32> {
        None
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }

    fn show_raw(&self) -> Option<bool> {
        self.raw.then_some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let config = CliConfig::parse_from([
            "vaheat",
            "--port",
            "/dev/ttyACM0",
            "--baud-rate",
            "921600",
            "--raw",
        ]);
        assert_eq!(config.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(ConfigProvider::baud_rate(&config), Some(921600));
        assert_eq!(ConfigProvider::show_raw(&config), Some(true));
        assert!(!config.verbose);
    }

    #[test]
    fn test_unset_flags_defer_to_other_layers() {
        let config = CliConfig::parse_from(["vaheat"]);
        assert!(ConfigProvider::port(&config).is_none());
        assert!(ConfigProvider::timeout_ms(&config).is_none());
        assert!(ConfigProvider::show_raw(&config).is_none());
    }
}
