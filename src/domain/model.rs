use crate::utils::error::{Result, VaheatError};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// JSON object of command parameters as typed at the prompt or built by callers.
pub type Params = Map<String, Value>;

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_OPEN_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;

/// An enumerated serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub name: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl PortInfo {
    pub fn usb(name: impl Into<String>, vid: u16, pid: u16) -> Self {
        Self {
            name: name.into(),
            vid: Some(vid),
            pid: Some(pid),
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }
}

/// Connection parameters for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    /// `None` means auto-detect on connect.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub timeout: Duration,
    pub open_retries: u32,
    pub retry_delay: Duration,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            open_retries: DEFAULT_OPEN_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatingMode {
    Auto,
    Direct,
    Shock,
    Profile,
}

impl HeatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Direct => "direct",
            Self::Shock => "shock",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for HeatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeatingMode {
    type Err = VaheatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "direct" => Ok(Self::Direct),
            "shock" => Ok(Self::Shock),
            "profile" => Ok(Self::Profile),
            _ => Err(VaheatError::invalid_parameter(
                "mode",
                s,
                "Mode must be one of auto, direct, shock, profile",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingMode {
    Off,
    Once,
    Continuous,
}

impl FromStr for StreamingMode {
    type Err = VaheatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "once" => Ok(Self::Once),
            "continuous" => Ok(Self::Continuous),
            _ => Err(VaheatError::invalid_parameter(
                "mode",
                s,
                "Streaming mode must be one of off, once, continuous",
            )),
        }
    }
}

/// Operating mode plus the parameters that apply to it.
///
/// Parameters that do not belong to the selected mode are dropped, so
/// `{"mode": "auto", "power": 50}` is sent as `{"mode": "auto"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeRequest {
    pub mode: HeatingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_number: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_limit_error: Option<bool>,
}

impl ModeRequest {
    pub fn new(mode: HeatingMode) -> Self {
        Self {
            mode,
            temperature: None,
            power: None,
            duration: None,
            profile_number: None,
            ignore_limit_error: None,
        }
    }

    /// Builds a request from loose parameters. A missing `mode` falls back to
    /// `default_mode`; with no default it is an error.
    pub fn from_params(params: &Params, default_mode: Option<HeatingMode>) -> Result<Self> {
        let mode = match params.get("mode") {
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(VaheatError::invalid_parameter(
                    "mode",
                    other,
                    "Mode must be a string",
                ))
            }
            None => default_mode.ok_or_else(|| VaheatError::missing_parameter("mode"))?,
        };

        let mut request = Self::new(mode);
        match mode {
            HeatingMode::Auto => {
                request.temperature = number_param(params, "temperature")?;
            }
            HeatingMode::Direct => {
                request.power = number_param(params, "power")?;
            }
            HeatingMode::Shock => {
                request.power = number_param(params, "power")?;
                request.duration = number_param(params, "duration")?;
                if let Some(duration) = request.duration {
                    validate_range("duration", duration, 0.1, 9999.0)?;
                }
            }
            HeatingMode::Profile => {
                request.profile_number = profile_number_param(params, "profile_number")?;
                request.ignore_limit_error = bool_param(params, "ignore_limit_error")?;
            }
        }
        Ok(request)
    }
}

/// Selects a stored profile, or one step of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileQuery {
    pub profile_number: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u8>,
}

impl ProfileQuery {
    pub fn new(profile_number: u8, step: Option<u8>) -> Result<Self> {
        validate_range("profile_number", profile_number, 1, 9)?;
        if let Some(step) = step {
            validate_range("step", step, 1, 20)?;
        }
        Ok(Self {
            profile_number,
            step,
        })
    }
}

fn number_param(params: &Params, key: &str) -> Result<Option<f64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| VaheatError::invalid_parameter(key, value, "Expected a number")),
    }
}

fn bool_param(params: &Params, key: &str) -> Result<Option<bool>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| VaheatError::invalid_parameter(key, value, "Expected true or false")),
    }
}

fn profile_number_param(params: &Params, key: &str) -> Result<Option<u8>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let number = value.as_i64().ok_or_else(|| {
                VaheatError::invalid_parameter(key, value, "Expected an integer")
            })?;
            validate_range(key, number, 1, 9)?;
            Ok(Some(number as u8))
        }
    }
}
