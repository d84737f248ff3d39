use crate::domain::model::PortInfo;
use crate::utils::error::{Result, VaheatError};

/// USB vendor ID of the VAHEAT (STMicroelectronics virtual COM port).
pub const VAHEAT_VID: u16 = 0x0483;
/// USB product ID of the VAHEAT.
pub const VAHEAT_PID: u16 = 0x5740;

pub fn is_vaheat(port: &PortInfo) -> bool {
    port.vid == Some(VAHEAT_VID) && port.pid == Some(VAHEAT_PID)
}

/// Names of the ports that belong to a VAHEAT, sorted by name.
pub fn find_vaheat_ports(ports: &[PortInfo]) -> Vec<String> {
    let mut names: Vec<String> = ports
        .iter()
        .filter(|port| is_vaheat(port))
        .map(|port| port.name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Picks the port to auto-connect to: the first VAHEAT found.
pub fn select_port(ports: &[PortInfo]) -> Result<String> {
    let devices = find_vaheat_ports(ports);
    let first = devices.first().cloned().ok_or(VaheatError::DeviceNotFound)?;

    tracing::info!("{} port is set.", first);
    if devices.len() > 1 {
        tracing::info!(
            "Multiple devices are connected ({}). Specify port to handle.",
            devices.join(", ")
        );
    }
    Ok(first)
}
