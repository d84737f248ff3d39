// Adapters layer: concrete transports and connectors for the ports in src/domain.

pub mod line;
pub mod serial;

pub use line::LineTransport;
pub use serial::{SerialConnector, SerialTransport};
