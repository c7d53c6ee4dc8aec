//! Read the present value of an analog input.
//!
//! Usage:
//!   BACFLOW_IFACE=eth0 cargo run -p bacflow-client --example read_property -- 192.168.1.20 1234

use bacflow_client::{BacnetClient, Device};
use bacflow_core::types::{ObjectId, ObjectType, PropertyId};
use bacflow_datalink::ip_address;
use std::net::{Ipv4Addr, SocketAddrV4};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let ip: Ipv4Addr = args.next().ok_or("missing device IP")?.parse()?;
    let instance: u32 = args.next().ok_or("missing device instance")?.parse()?;

    let interface = std::env::var("BACFLOW_IFACE").unwrap_or_else(|_| "eth0".into());
    let client = BacnetClient::new(&interface, 47808).await?;
    let device = Device::new(ip_address(SocketAddrV4::new(ip, 47808)), instance)?;

    let value = client
        .read_property(
            &device,
            ObjectId::new(ObjectType::AnalogInput, 1)?,
            PropertyId::PresentValue,
        )
        .await?;
    println!("analog-input:1 present-value = {value:?}");
    Ok(())
}
