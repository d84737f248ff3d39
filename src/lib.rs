pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{SerialConnector, SerialTransport};
pub use app::Repl;
pub use config::{resolve, ResolvedConfig, TomlConfig};
pub use crate::core::device::Vaheat;
pub use domain::model::{DeviceSettings, HeatingMode, ModeRequest, PortInfo, ProfileQuery};
pub use utils::error::{Result, VaheatError};
