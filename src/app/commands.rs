use crate::core::command::ApiCommand;
use crate::utils::error::{Result, VaheatError};
use std::str::FromStr;

/// Commands accepted at the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
    Connect,
    Disconnect,
    Port,
    BaudRate,
    GetInfo,
    GetStatus,
    GetSettings,
    GetStreaming,
    GetProfile,
    StartHeating,
    StopHeating,
    StartStreaming,
    StopStreaming,
    DoReset,
    SetKeylock,
    SetSettings,
    SetStreaming,
    SetMode,
    SetProfile,
    Raw,
    Error,
    Read,
    ReadAll,
    Write,
    Help,
    Exit,
}

/// (command, name, description)
const COMMAND_TABLE: &[(CliCommand, &str, &str)] = &[
    (CliCommand::Connect, "connect", "Open the serial connection"),
    (CliCommand::Disconnect, "disconnect", "Close the serial connection"),
    (CliCommand::Port, "port", "Change the port, e.g. COM3, /dev/ttyUSB*, /dev/ttyACM*"),
    (CliCommand::BaudRate, "baud_rate", "Change the baud rate"),
    (CliCommand::GetInfo, "get_info", "Device information"),
    (CliCommand::GetStatus, "get_status", "Device status"),
    (CliCommand::GetSettings, "get_settings", "Settings stored on the device"),
    (CliCommand::GetStreaming, "get_streaming", "Streaming settings"),
    (CliCommand::GetProfile, "get_profile", "A stored profile or profile step"),
    (CliCommand::StartHeating, "start_heating", "Change mode and start heating"),
    (CliCommand::StopHeating, "stop_heating", "Stop heating immediately"),
    (CliCommand::StartStreaming, "start_streaming", "Start streaming (once or continuous)"),
    (CliCommand::StopStreaming, "stop_streaming", "Stop streaming"),
    (CliCommand::DoReset, "do_reset", "Reset parts of the device"),
    (CliCommand::SetKeylock, "set_keylock", "Lock or unlock the device keys"),
    (CliCommand::SetSettings, "set_settings", "Change device settings"),
    (CliCommand::SetStreaming, "set_streaming", "Change streaming settings"),
    (CliCommand::SetMode, "set_mode", "Change the operating mode"),
    (CliCommand::SetProfile, "set_profile", "Write a profile"),
    (CliCommand::Raw, "raw", "Toggle showing raw text sent and received"),
    (CliCommand::Error, "error", "The latest error reported by the device"),
    (CliCommand::Read, "read", "Read one raw line"),
    (CliCommand::ReadAll, "read_all", "Read all raw lines"),
    (CliCommand::Write, "write", "Write a raw JSON string"),
    (CliCommand::Help, "help", "List commands"),
    (CliCommand::Exit, "exit", "Disconnect and quit"),
];

impl CliCommand {
    pub fn all() -> impl Iterator<Item = (CliCommand, &'static str, &'static str)> {
        COMMAND_TABLE.iter().copied()
    }

    pub fn name(&self) -> &'static str {
        COMMAND_TABLE
            .iter()
            .find(|(command, _, _)| command == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("unknown")
    }

    /// The device command behind a parameterized prompt command.
    pub fn api_command(&self) -> Option<ApiCommand> {
        self.name().parse().ok()
    }
}

impl FromStr for CliCommand {
    type Err = VaheatError;

    fn from_str(s: &str) -> Result<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(_, name, _)| *name == s)
            .map(|(command, _, _)| *command)
            .ok_or_else(|| VaheatError::invalid_parameter("command", s, "Unknown command"))
    }
}

/// Loosens prompt input into JSON: single quotes and Python-style booleans
/// are accepted.
pub fn normalize_json_input(input: &str) -> String {
    input
        .trim()
        .replace('\'', "\"")
        .replace("True", "true")
        .replace("False", "false")
}
