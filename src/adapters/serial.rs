use crate::adapters::line::LineTransport;
use crate::domain::model::{DeviceSettings, PortInfo};
use crate::domain::ports::Connector;
use crate::utils::error::{Result, VaheatError};
use async_trait::async_trait;
use tokio_serial::{
    DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialPortInfo, SerialPortType,
    SerialStream, StopBits,
};

pub type SerialTransport = LineTransport<SerialStream>;

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            _ => Self {
                name: info.port_name,
                vid: None,
                pid: None,
                manufacturer: None,
                product: None,
                serial_number: None,
            },
        }
    }
}

/// Lists the serial ports known to the operating system.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let mut ports: Vec<PortInfo> = tokio_serial::available_ports()?
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ports)
}

/// Opens real serial ports, 8N1 without flow control.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

#[async_trait]
impl Connector for SerialConnector {
    type Transport = SerialTransport;

    fn list_ports(&self) -> Result<Vec<PortInfo>> {
        list_ports()
    }

    async fn open(&self, port: &str, settings: &DeviceSettings) -> Result<SerialTransport> {
        tracing::debug!("Opening {} at {} baud", port, settings.baud_rate);
        let stream = tokio_serial::new(port, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout)
            .open_native_async()
            .map_err(|e| VaheatError::PortOpen {
                port: port.to_string(),
                reason: e.to_string(),
            })?;
        Ok(LineTransport::new(stream, settings.timeout))
    }
}
