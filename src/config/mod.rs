#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::core::{ConfigProvider, DeviceSettings};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_baud_rate, validate_port_name, validate_positive_number, Validate,
};
use std::time::Duration;

/// Settings after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedConfig {
    pub device: DeviceSettings,
    pub show_raw: bool,
}

/// Merges configuration layers. The first layer that sets a value wins;
/// values nobody sets keep their defaults.
pub fn resolve(layers: &[&dyn ConfigProvider]) -> Result<ResolvedConfig> {
    let defaults = DeviceSettings::default();

    let port = layers.iter().find_map(|l| l.port()).map(str::to_string);
    let baud_rate = layers
        .iter()
        .find_map(|l| l.baud_rate())
        .unwrap_or(defaults.baud_rate);
    let timeout = layers
        .iter()
        .find_map(|l| l.timeout_ms())
        .map(Duration::from_millis)
        .unwrap_or(defaults.timeout);
    let open_retries = layers
        .iter()
        .find_map(|l| l.open_retries())
        .unwrap_or(defaults.open_retries);
    let retry_delay = layers
        .iter()
        .find_map(|l| l.retry_delay_ms())
        .map(Duration::from_millis)
        .unwrap_or(defaults.retry_delay);
    let show_raw = layers.iter().find_map(|l| l.show_raw()).unwrap_or(false);

    let resolved = ResolvedConfig {
        device: DeviceSettings {
            port,
            baud_rate,
            timeout,
            open_retries,
            retry_delay,
        },
        show_raw,
    };
    resolved.validate()?;
    Ok(resolved)
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        if let Some(port) = &self.device.port {
            validate_port_name("port", port)?;
        }
        validate_baud_rate("baud_rate", self.device.baud_rate)?;
        validate_positive_number("timeout_ms", self.device.timeout.as_millis() as u64, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Layer {
        port: Option<&'static str>,
        baud_rate: Option<u32>,
        timeout_ms: Option<u64>,
    }

    impl ConfigProvider for Layer {
        fn port(&self) -> Option<&str> {
            self.port
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
            None
        }
    }

    #[test]
    fn test_first_layer_wins() {
        let cli = Layer {
            port: Some("/dev/ttyACM1"),
            baud_rate: None,
            timeout_ms: None,
        };
        let file = Layer {
            port: Some("/dev/ttyACM0"),
            baud_rate: Some(921600),
            timeout_ms: None,
        };

        let resolved = resolve(&[&cli, &file]).unwrap();
        assert_eq!(resolved.device.port.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(resolved.device.baud_rate, 921600);
        assert_eq!(resolved.device.timeout, Duration::from_millis(500));
        assert!(!resolved.show_raw);
    }

    #[test]
    fn test_defaults_without_layers() {
        let resolved = resolve(&[]).unwrap();
        assert_eq!(resolved, ResolvedConfig::default());
        assert!(resolved.device.port.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let layer = Layer {
            port: None,
            baud_rate: Some(12345),
            timeout_ms: None,
        };
        assert!(resolve(&[&layer]).is_err());

        let layer = Layer {
            port: None,
            baud_rate: None,
            timeout_ms: Some(0),
        };
        assert!(resolve(&[&layer]).is_err());
    }
}
