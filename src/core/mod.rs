pub mod command;
pub mod device;
pub mod discovery;
pub mod response;

pub use crate::domain::model::{DeviceSettings, Params, PortInfo};
pub use crate::domain::ports::{ConfigProvider, Connector, Transport};
pub use crate::utils::error::Result;
