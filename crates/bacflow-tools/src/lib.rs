//! Argument parsing and output helpers shared by the bacflow binaries.

use bacflow_client::{BacnetClient, ClientDataValue, ClientError, Device};
use bacflow_core::types::{Address, MacAddr, ObjectId, ObjectType, PropertyId};
use bacflow_datalink::{ip_address, BacnetIpTransport, BACNET_IP_DEFAULT_PORT};
use clap::{Args, ValueEnum};
use std::net::SocketAddrV4;
use std::path::PathBuf;

/// Which local interface to bind.
#[derive(Args, Debug, Clone)]
pub struct InterfaceArgs {
    /// Interface name, e.g. `eth0`.
    #[arg(long, short = 'i')]
    pub interface: String,
    #[arg(long, default_value_t = BACNET_IP_DEFAULT_PORT)]
    pub port: u16,
}

impl InterfaceArgs {
    pub async fn connect(&self) -> Result<BacnetClient<BacnetIpTransport>, ClientError> {
        BacnetClient::new(&self.interface, self.port).await
    }
}

/// The device a confirmed request goes to.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// `IP[:PORT]` of the device or of the router in front of it.
    #[arg(long, short = 'a', value_parser = parse_ip_endpoint)]
    pub address: SocketAddrV4,
    /// Device instance; the wildcard instance when unknown.
    #[arg(long, short = 'd', default_value_t = WILDCARD_INSTANCE)]
    pub device: u32,
    /// Largest APDU the device accepts.
    #[arg(long, default_value_t = 1476)]
    pub max_apdu: u32,
    /// Remote network number for a routed device.
    #[arg(long, requires = "adr")]
    pub net: Option<u16>,
    /// Hex MAC of a routed device on `--net`.
    #[arg(long, value_parser = parse_hex, requires = "net")]
    pub adr: Option<MacAddr>,
}

/// Device instance every device answers to.
pub const WILDCARD_INSTANCE: u32 = 0x3F_FFFF;

impl TargetArgs {
    pub fn address(&self) -> Address {
        let mut address = ip_address(self.address);
        if let (Some(net), Some(adr)) = (self.net, self.adr) {
            address.net = net;
            address.adr = adr;
        }
        address
    }

    pub fn device(&self) -> Result<Device, ClientError> {
        let mut device = Device::new(self.address(), self.device)?;
        device.max_apdu = self.max_apdu;
        Ok(device)
    }
}

/// Parses `IP` or `IP:PORT`, defaulting the port to 47808.
pub fn parse_ip_endpoint(text: &str) -> Result<SocketAddrV4, String> {
    if let Ok(endpoint) = text.parse::<SocketAddrV4>() {
        return Ok(endpoint);
    }
    text.parse()
        .map(|ip| SocketAddrV4::new(ip, BACNET_IP_DEFAULT_PORT))
        .map_err(|_| format!("'{text}' is not IP or IP:PORT"))
}

/// Parses a hex MAC such as `0a:00:00:05` or `0a000005`.
pub fn parse_hex(text: &str) -> Result<MacAddr, String> {
    let digits: String = text.chars().filter(|c| *c != ':').collect();
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("'{text}': '{bad}' is not a hex digit"));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("'{text}' has an odd number of hex digits"));
    }
    let bytes = (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("'{text}': {e}"))?;
    MacAddr::new(&bytes).map_err(|e| format!("'{text}': {e}"))
}

/// Parses a property by protocol name (`present-value`) or number.
pub fn parse_property(text: &str) -> Result<PropertyId, String> {
    PropertyId::from_name(text).ok_or_else(|| format!("unknown property '{text}'"))
}

/// Parses `TYPE:INSTANCE`, the type given by name (`analog-input`) or number.
pub fn parse_object_id(text: &str) -> Result<ObjectId, String> {
    let (kind, instance) = text
        .split_once(':')
        .ok_or_else(|| format!("'{text}' is not TYPE:INSTANCE"))?;
    let object_type =
        ObjectType::from_name(kind).ok_or_else(|| format!("unknown object type '{kind}'"))?;
    let instance = instance
        .parse()
        .map_err(|_| format!("bad instance '{instance}'"))?;
    ObjectId::new(object_type, instance).map_err(|e| format!("'{text}': {e}"))
}

/// Application type of a value given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
    Null,
    Boolean,
    Unsigned,
    Signed,
    Real,
    Double,
    Enumerated,
    String,
}

impl ValueKind {
    pub fn parse(self, text: &str) -> Result<ClientDataValue, String> {
        Ok(match self {
            Self::Null => ClientDataValue::Null,
            Self::Boolean => match text {
                "true" | "1" | "active" => ClientDataValue::Boolean(true),
                "false" | "0" | "inactive" => ClientDataValue::Boolean(false),
                _ => return Err(format!("'{text}' is not a boolean")),
            },
            Self::Unsigned => {
                ClientDataValue::Unsigned(text.parse().map_err(|_| self.invalid(text))?)
            }
            Self::Signed => {
                ClientDataValue::Signed(text.parse().map_err(|_| self.invalid(text))?)
            }
            Self::Real => {
                ClientDataValue::Real(text.parse().map_err(|_| self.invalid(text))?)
            }
            Self::Double => {
                ClientDataValue::Double(text.parse().map_err(|_| self.invalid(text))?)
            }
            Self::Enumerated => {
                ClientDataValue::Enumerated(text.parse().map_err(|_| self.invalid(text))?)
            }
            Self::String => ClientDataValue::CharacterString(text.to_owned()),
        })
    }

    fn invalid(self, text: &str) -> String {
        format!("'{text}' is not a valid {self:?} value")
    }
}

/// Splits `[start, end]` into at most `parts` contiguous sub-ranges.
pub fn split_range(start: u32, end: u32, parts: usize) -> Vec<(u32, u32)> {
    if start > end {
        return Vec::new();
    }
    let span = u64::from(end - start) + 1;
    let parts = (parts.max(1) as u64).min(span);
    let step = span.div_ceil(parts);
    let mut ranges = Vec::with_capacity(parts as usize);
    let mut low = u64::from(start);
    while low <= u64::from(end) {
        let high = (low + step - 1).min(u64::from(end));
        ranges.push((low as u32, high as u32));
        low = high + 1;
    }
    ranges
}

/// Writes `value` as pretty JSON to `path`, or to stdout without one.
pub fn write_json<T: serde::Serialize>(
    value: &T,
    path: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_by_name_or_number() {
        assert_eq!(parse_property("present-value"), Ok(PropertyId::PresentValue));
        assert_eq!(parse_property("85"), Ok(PropertyId::PresentValue));
        assert!(parse_property("presentValue").is_err());
    }

    #[test]
    fn object_ids_by_type_name() {
        assert_eq!(
            parse_object_id("analog-input:7"),
            Ok(ObjectId::new(ObjectType::AnalogInput, 7).unwrap())
        );
        assert_eq!(
            parse_object_id("8:1234"),
            Ok(ObjectId::device(1234).unwrap())
        );
        assert!(parse_object_id("analog-input").is_err());
        assert!(parse_object_id("analog-input:4194304").is_err());
    }

    #[test]
    fn endpoint_port_defaults() {
        assert_eq!(
            parse_ip_endpoint("10.0.0.5"),
            Ok("10.0.0.5:47808".parse().unwrap())
        );
        assert_eq!(
            parse_ip_endpoint("10.0.0.5:47809"),
            Ok("10.0.0.5:47809".parse().unwrap())
        );
        assert!(parse_ip_endpoint("plant-controller").is_err());
    }

    #[test]
    fn hex_mac() {
        assert_eq!(parse_hex("0a:00:00:05").unwrap().as_slice(), &[10, 0, 0, 5]);
        assert_eq!(parse_hex("2c").unwrap().as_slice(), &[0x2c]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("aé0").is_err());
        assert!(parse_hex("0x0a").is_err());
    }

    #[test]
    fn values_by_kind() {
        assert_eq!(ValueKind::Real.parse("21.5"), Ok(ClientDataValue::Real(21.5)));
        assert_eq!(ValueKind::Boolean.parse("active"), Ok(ClientDataValue::Boolean(true)));
        assert!(ValueKind::Unsigned.parse("-1").is_err());
    }

    #[test]
    fn ranges_split_evenly() {
        assert_eq!(split_range(0, 99, 4), vec![(0, 24), (25, 49), (50, 74), (75, 99)]);
        assert_eq!(split_range(5, 6, 8), vec![(5, 5), (6, 6)]);
        assert_eq!(split_range(0, 10, 0), vec![(0, 10)]);
        assert!(split_range(9, 1, 2).is_empty());
        assert_eq!(
            split_range(0, 0x3F_FFFF, 2),
            vec![(0, 0x1F_FFFF), (0x20_0000, 0x3F_FFFF)]
        );
    }
}
