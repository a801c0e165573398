//! Serial connector for USB CDC / UART sensor boards
//!
//! Opens the configured port, or auto-detects a board by USB vendor ID
//! on every connection attempt so an unplugged board can come back on a
//! different port name.

use super::Connector;
use crate::config::SerialConfig;
use crate::error::{BridgeError, Result};
use serde::Serialize;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortInfo, SerialPortType, StopBits};
use std::time::Duration;
use tracing::debug;

/// Serial connector
///
/// # Example
///
/// ```ignore
/// let connector = SerialConnector::from_config(&config.serial);
/// let bridge = SerialBridge::start(connector, options)?;
/// ```
#[derive(Debug, Clone)]
pub struct SerialConnector {
    /// Fixed port name, or `None` for auto-detection
    port_name: Option<String>,
    baud_rate: u32,
    timeout: Duration,
    vids: Vec<u16>,
}

impl SerialConnector {
    /// Create a connector for a fixed port
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: Some(port_name.into()),
            baud_rate,
            timeout: Duration::from_millis(crate::constants::SERIAL_READ_TIMEOUT_MS),
            vids: crate::constants::DEFAULT_DEVICE_VIDS.to_vec(),
        }
    }

    /// Create a connector from config (empty port = auto-detect)
    pub fn from_config(config: &SerialConfig) -> Self {
        let port_name = if config.port.is_empty() {
            None
        } else {
            Some(config.port.clone())
        };
        Self {
            port_name,
            baud_rate: config.baud_rate,
            timeout: config.read_timeout(),
            vids: config.device_vids.clone(),
        }
    }

    /// Detect a USB device whose vendor ID is in `vids`
    ///
    /// # Errors
    ///
    /// - `NoDeviceFound` - No matching device found
    /// - `MultipleDevicesFound` - More than one matching device found
    pub fn detect(vids: &[u16]) -> Result<String> {
        let ports = serialport::available_ports().unwrap_or_default();
        select_device(&ports, vids)
    }

    /// Open a serial port with 8N1 framing and no flow control
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Box<dyn SerialPort>> {
        serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| BridgeError::SerialOpen {
                port: port_name.to_string(),
                source: std::io::Error::other(e.to_string()),
            })
    }
}

impl Connector for SerialConnector {
    type Port = Box<dyn SerialPort>;

    fn connect(&mut self) -> Result<Self::Port> {
        let port_name = match &self.port_name {
            Some(p) => p.clone(),
            None => {
                let p = Self::detect(&self.vids)?;
                debug!("Detected sensor board on {}", p);
                p
            }
        };
        Self::open(&port_name, self.baud_rate, self.timeout)
    }

    fn describe(&self) -> String {
        match &self.port_name {
            Some(p) => format!("{} @ {} baud", p, self.baud_rate),
            None => format!("auto-detect @ {} baud", self.baud_rate),
        }
    }
}

/// Check if a port is a USB device from one of the accepted vendors
fn is_candidate(port: &SerialPortInfo, vids: &[u16]) -> bool {
    matches!(&port.port_type, SerialPortType::UsbPort(usb) if vids.contains(&usb.vid))
}

fn select_device(ports: &[SerialPortInfo], vids: &[u16]) -> Result<String> {
    let matching: Vec<_> = ports.iter().filter(|p| is_candidate(p, vids)).collect();

    match matching.len() {
        0 => Err(BridgeError::NoDeviceFound),
        1 => Ok(matching[0].port_name.clone()),
        n => Err(BridgeError::MultipleDevicesFound { count: n }),
    }
}

// =============================================================================
// Port listing
// =============================================================================

/// Serial port description for the `list` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSummary {
    pub name: String,
    pub kind: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub product: Option<String>,
}

impl From<&SerialPortInfo> for PortSummary {
    fn from(info: &SerialPortInfo) -> Self {
        match &info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name.clone(),
                kind: "usb".into(),
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product.clone(),
            },
            SerialPortType::PciPort => Self::other(info, "pci"),
            SerialPortType::BluetoothPort => Self::other(info, "bluetooth"),
            SerialPortType::Unknown => Self::other(info, "unknown"),
        }
    }
}

impl PortSummary {
    fn other(info: &SerialPortInfo, kind: &str) -> Self {
        Self {
            name: info.port_name.clone(),
            kind: kind.into(),
            vid: None,
            pid: None,
            product: None,
        }
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<PortSummary>> {
    let ports = serialport::available_ports().map_err(|e| BridgeError::SerialEnumerate {
        source: std::io::Error::other(e.to_string()),
    })?;
    Ok(ports.iter().map(PortSummary::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(name: &str, vid: u16) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.into(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid,
                pid: 0x0043,
                serial_number: None,
                manufacturer: None,
                product: Some("Uno".into()),
            }),
        }
    }

    fn pci(name: &str) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.into(),
            port_type: SerialPortType::PciPort,
        }
    }

    #[test]
    fn test_serial_connector_new() {
        let connector = SerialConnector::new("COM3", 9600);
        assert_eq!(connector.describe(), "COM3 @ 9600 baud");
    }

    #[test]
    fn test_serial_connector_from_config_auto() {
        let connector = SerialConnector::from_config(&SerialConfig::default());
        assert_eq!(connector.describe(), "auto-detect @ 9600 baud");
    }

    #[test]
    fn test_select_single_device() {
        let ports = vec![pci("/dev/ttyS0"), usb("/dev/ttyACM0", 0x2341)];
        assert_eq!(select_device(&ports, &[0x2341]).unwrap(), "/dev/ttyACM0");
    }

    #[test]
    fn test_select_no_device() {
        let ports = vec![pci("/dev/ttyS0"), usb("/dev/ttyUSB0", 0x1234)];
        assert!(matches!(select_device(&ports, &[0x2341]), Err(BridgeError::NoDeviceFound)));
    }

    #[test]
    fn test_select_multiple_devices() {
        let ports = vec![usb("COM3", 0x2341), usb("COM4", 0x1A86)];
        assert!(matches!(
            select_device(&ports, &[0x2341, 0x1A86]),
            Err(BridgeError::MultipleDevicesFound { count: 2 })
        ));
    }

    #[test]
    fn test_port_summary_usb() {
        let summary = PortSummary::from(&usb("COM3", 0x2341));
        assert_eq!(summary.kind, "usb");
        assert_eq!(summary.vid, Some(0x2341));
        assert_eq!(summary.product.as_deref(), Some("Uno"));
    }
}
