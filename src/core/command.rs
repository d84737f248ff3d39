use crate::utils::error::{Result, VaheatError};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Commands understood by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCommand {
    GetInfo,
    GetStatus,
    GetSettings,
    GetStreaming,
    GetProfile,
    StartHeating,
    StopHeating,
    DoReset,
    SetKeylock,
    SetSettings,
    SetStreaming,
    SetMode,
    SetProfile,
}

impl ApiCommand {
    pub const ALL: [ApiCommand; 13] = [
        Self::GetInfo,
        Self::GetStatus,
        Self::GetSettings,
        Self::GetStreaming,
        Self::GetProfile,
        Self::StartHeating,
        Self::StopHeating,
        Self::DoReset,
        Self::SetKeylock,
        Self::SetSettings,
        Self::SetStreaming,
        Self::SetMode,
        Self::SetProfile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetInfo => "get_info",
            Self::GetStatus => "get_status",
            Self::GetSettings => "get_settings",
            Self::GetStreaming => "get_streaming",
            Self::GetProfile => "get_profile",
            Self::StartHeating => "start_heating",
            Self::StopHeating => "stop_heating",
            Self::DoReset => "do_reset",
            Self::SetKeylock => "set_keylock",
            Self::SetSettings => "set_settings",
            Self::SetStreaming => "set_streaming",
            Self::SetMode => "set_mode",
            Self::SetProfile => "set_profile",
        }
    }

    /// Parameter names shown to the user before a JSON argument is requested.
    pub fn parameter_hint(&self) -> Option<&'static str> {
        match self {
            Self::GetProfile => Some("profile_number,step"),
            Self::StartHeating => {
                Some("mode,power,temperature,duration,profile_number,ignore_limit_error")
            }
            Self::DoReset => Some("all,profiles,settings,pid,profile_number"),
            Self::SetKeylock => Some("(bool)"),
            Self::SetSettings => {
                Some("brightness,haptic_strength,temperature_limit,limit_enabled,pid{p,i,d}")
            }
            Self::SetStreaming => Some(
                "mode,rate,time,remaining,onoff,temperature,setpoint,power,profile_step,resistance",
            ),
            Self::SetMode => Some("mode,power,temperature,duration,profile_number"),
            Self::SetProfile => Some("profile_number,name,steps,duration,rate,setpoint"),
            Self::GetInfo
            | Self::GetStatus
            | Self::GetSettings
            | Self::GetStreaming
            | Self::StopHeating => None,
        }
    }

    /// Encodes the command as sent on the wire: `{"<name>": <data>}`, with
    /// `true` standing in for commands without parameters.
    pub fn encode(&self, data: Option<Value>) -> Result<String> {
        let mut body = Map::new();
        body.insert(self.name().to_string(), data.unwrap_or(Value::Bool(true)));
        Ok(serde_json::to_string(&Value::Object(body))?)
    }
}

impl fmt::Display for ApiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiCommand {
    type Err = VaheatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.name() == s)
            .ok_or_else(|| VaheatError::invalid_parameter("command", s, "Command not allowed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_without_data_sends_true() {
        assert_eq!(
            ApiCommand::GetInfo.encode(None).unwrap(),
            r#"{"get_info":true}"#
        );
        assert_eq!(
            ApiCommand::StopHeating.encode(None).unwrap(),
            r#"{"stop_heating":true}"#
        );
    }

    #[test]
    fn test_encode_with_data() {
        let encoded = ApiCommand::SetKeylock.encode(Some(json!(false))).unwrap();
        assert_eq!(encoded, r#"{"set_keylock":false}"#);

        let encoded = ApiCommand::GetProfile
            .encode(Some(json!({"profile_number": 1})))
            .unwrap();
        assert_eq!(encoded, r#"{"get_profile":{"profile_number":1}}"#);
    }

    #[test]
    fn test_names_round_trip() {
        for command in ApiCommand::ALL {
            assert_eq!(command.name().parse::<ApiCommand>().unwrap(), command);
        }
        assert!("format_disk".parse::<ApiCommand>().is_err());
    }

    #[test]
    fn test_parameter_hints() {
        assert!(ApiCommand::GetInfo.parameter_hint().is_none());
        assert_eq!(ApiCommand::SetKeylock.parameter_hint(), Some("(bool)"));
        assert!(ApiCommand::StartHeating
            .parameter_hint()
            .unwrap()
            .starts_with("mode,"));
    }
}
