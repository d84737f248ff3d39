use crate::domain::model::{DeviceSettings, PortInfo};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Text I/O over an open device connection.
#[async_trait]
pub trait Transport: Send {
    /// Writes `data` exactly as given.
    async fn write(&mut self, data: &str) -> Result<()>;

    /// Reads one line without its terminator. `None` when the read timeout
    /// expires (or the peer closes) before any byte arrives.
    async fn read_line(&mut self) -> Result<Option<String>>;

    async fn close(&mut self) -> Result<()>;
}

/// Enumerates ports and opens transports on them.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    fn list_ports(&self) -> Result<Vec<PortInfo>>;

    async fn open(&self, port: &str, settings: &DeviceSettings) -> Result<Self::Transport>;
}

/// One layer of connection settings. `None` defers to the next layer.
pub trait ConfigProvider {
    fn port(&self) -> Option<&str>;
    fn baud_rate(&self) -> Option<u32>;
    fn timeout_ms(&self) -> Option<u64>;
    fn open_retries(&self) -> Option<u32>;
    fn retry_delay_ms(&self) -> Option<u64>;
    fn show_raw(&self) -> Option<bool>;
}
