use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaheatError {
    #[error("No connected VAHEAT devices")]
    DeviceNotFound,

    #[error("Failed to open serial port '{port}': {reason}")]
    PortOpen { port: String, reason: String },

    #[error("Device is not connected")]
    NotConnected,

    #[error("Malformed response: {message} (raw: {raw})")]
    MalformedResponse { message: String, raw: String },

    #[error("Device rejected the command: {response}")]
    DeviceRejected { response: String },

    #[error("Alarm status: {alarm}. Check hardware")]
    AlarmActive { alarm: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidParameter {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing parameter: {field}")]
    MissingParameter { field: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Protocol,
    Device,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VaheatError {
    pub fn invalid_parameter(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing_parameter(field: impl Into<String>) -> Self {
        Self::MissingParameter {
            field: field.into(),
        }
    }

    pub fn malformed(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DeviceNotFound | Self::PortOpen { .. } | Self::NotConnected => {
                ErrorCategory::Connection
            }
            Self::MalformedResponse { .. } | Self::Serialization(_) => ErrorCategory::Protocol,
            Self::DeviceRejected { .. } | Self::AlarmActive { .. } => ErrorCategory::Device,
            Self::InvalidParameter { .. } | Self::MissingParameter { .. } => ErrorCategory::Input,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Io(_) | Self::Serial(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidParameter { .. } | Self::MissingParameter { .. } => ErrorSeverity::Low,
            Self::MalformedResponse { .. }
            | Self::Serialization(_)
            | Self::DeviceRejected { .. }
            | Self::NotConnected => ErrorSeverity::Medium,
            Self::DeviceNotFound
            | Self::PortOpen { .. }
            | Self::AlarmActive { .. }
            | Self::ConfigError { .. } => ErrorSeverity::High,
            Self::Io(_) | Self::Serial(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotFound => "Plug in the VAHEAT over USB or pass --port explicitly",
            Self::PortOpen { .. } => {
                "Check that the port exists and is not held by another program"
            }
            Self::NotConnected => "Run 'connect' first",
            Self::MalformedResponse { .. } | Self::Serialization(_) => {
                "Retry the command; use 'raw' to inspect the bytes on the wire"
            }
            Self::DeviceRejected { .. } => "Check the parameters against the device manual",
            Self::AlarmActive { .. } => "Check the heater and sensor wiring, then retry",
            Self::InvalidParameter { .. } | Self::MissingParameter { .. } => {
                "Correct the parameters and retry"
            }
            Self::ConfigError { .. } => "Fix the configuration file or command line flags",
            Self::Io(_) | Self::Serial(_) => "Reconnect the device and retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DeviceNotFound => "VAHEAT device was not found.".to_string(),
            Self::PortOpen { port, .. } => format!("Could not open serial port {}.", port),
            Self::NotConnected => "Device is not connected.".to_string(),
            Self::MalformedResponse { .. } | Self::Serialization(_) => {
                "The device sent a response that could not be decoded.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VaheatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_open_message_names_port() {
        let error = VaheatError::PortOpen {
            port: "/dev/ttyACM0".to_string(),
            reason: "Permission denied".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("/dev/ttyACM0"));
        assert!(msg.contains("Permission denied"));
        assert_eq!(error.category(), ErrorCategory::Connection);
        assert!(error.user_friendly_message().contains("/dev/ttyACM0"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(VaheatError::missing_parameter("mode").severity() < ErrorSeverity::Medium);
        assert_eq!(VaheatError::DeviceNotFound.severity(), ErrorSeverity::High);
        assert_eq!(
            VaheatError::Io(std::io::Error::other("gone")).severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_invalid_parameter_display() {
        let error = VaheatError::invalid_parameter("profile_number", 12, "must be 1-9");
        assert_eq!(
            error.to_string(),
            "Invalid value '12' for 'profile_number': must be 1-9"
        );
    }
}
