use crate::utils::error::{Result, VaheatError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// VAHEAT 支援的鮑率
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    9600, 14400, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

pub fn validate_port_name(field_name: &str, port: &str) -> Result<()> {
    validate_non_empty_string(field_name, port)?;

    if port.contains('\0') {
        return Err(VaheatError::invalid_parameter(
            field_name,
            port,
            "Port name contains null bytes",
        ));
    }

    Ok(())
}

pub fn validate_baud_rate(field_name: &str, baud_rate: u32) -> Result<()> {
    if !SUPPORTED_BAUD_RATES.contains(&baud_rate) {
        let allowed: Vec<String> = SUPPORTED_BAUD_RATES.iter().map(u32::to_string).collect();
        return Err(VaheatError::invalid_parameter(
            field_name,
            baud_rate,
            format!("Unsupported baud rate. Allowed: {}", allowed.join(", ")),
        ));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(VaheatError::invalid_parameter(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VaheatError::invalid_parameter(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(VaheatError::invalid_parameter(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_baud_rate() {
        assert!(validate_baud_rate("baud_rate", 115200).is_ok());
        assert!(validate_baud_rate("baud_rate", 921600).is_ok());
        assert!(validate_baud_rate("baud_rate", 1_000_000).is_err());
        assert!(validate_baud_rate("baud_rate", 0).is_err());
    }

    #[test]
    fn test_validate_port_name() {
        assert!(validate_port_name("port", "/dev/ttyACM0").is_ok());
        assert!(validate_port_name("port", "COM3").is_ok());
        assert!(validate_port_name("port", "  ").is_err());
        assert!(validate_port_name("port", "COM\03").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("profile_number", 1, 1, 9).is_ok());
        assert!(validate_range("profile_number", 9, 1, 9).is_ok());
        assert!(validate_range("profile_number", 0, 1, 9).is_err());
        assert!(validate_range("step", 21, 1, 20).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("timeout_ms", 500, 1).is_ok());
        assert!(validate_positive_number("timeout_ms", 0, 1).is_err());
    }
}
