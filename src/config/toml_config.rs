use crate::core::ConfigProvider;
use crate::utils::error::{Result, VaheatError};
use crate::utils::validation::{validate_baud_rate, validate_port_name, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub cli: CliSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceSection {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub open_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliSection {
    pub show_raw: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| VaheatError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VAHEAT_PORT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| VaheatError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for TomlConfig {
    fn port(&self) -> Option<&str> {
        self.device.port.as_deref()
    }

    fn baud_rate(&self) -> Option<u32> {
        self.device.baud_rate
    }

    fn timeout_ms(&self) -> Option<u64> {
        self.device.timeout_ms
    }

    fn open_retries(&self) -> Option<u32> {
        self.device.open_retries
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        self.device.retry_delay_ms
    }

    fn show_raw(&self) -> Option<bool> {
        self.cli.show_raw
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(port) = &self.device.port {
            validate_port_name("device.port", port)?;
        }
        if let Some(baud_rate) = self.device.baud_rate {
            validate_baud_rate("device.baud_rate", baud_rate)?;
        }
        if self.device.timeout_ms == Some(0) {
            return Err(VaheatError::invalid_parameter(
                "device.timeout_ms",
                0,
                "Timeout must be at least 1 ms",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_device_section() {
        let toml_content = r#"
[device]
port = "/dev/ttyACM0"
baud_rate = 921600
timeout_ms = 250
open_retries = 5

[cli]
show_raw = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(ConfigProvider::port(&config), Some("/dev/ttyACM0"));
        assert_eq!(ConfigProvider::baud_rate(&config), Some(921600));
        assert_eq!(ConfigProvider::timeout_ms(&config), Some(250));
        assert_eq!(ConfigProvider::open_retries(&config), Some(5));
        assert_eq!(ConfigProvider::retry_delay_ms(&config), None);
        assert_eq!(ConfigProvider::show_raw(&config), Some(true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(ConfigProvider::port(&config).is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VAHEAT_TEST_PORT", "COM9");

        let toml_content = r#"
[device]
port = "${VAHEAT_TEST_PORT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.device.port.as_deref(), Some("COM9"));

        std::env::remove_var("VAHEAT_TEST_PORT");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str("[device]\nbaud_rate = 1234\n").unwrap();
        assert!(config.validate().is_err());

        assert!(matches!(
            TomlConfig::from_toml_str("[device]\nbaud_rate = \"fast\"\n"),
            Err(VaheatError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[device]\nport = \"COM4\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.device.port.as_deref(), Some("COM4"));
    }
}
