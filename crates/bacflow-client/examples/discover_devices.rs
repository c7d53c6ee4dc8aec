//! Discover BACnet devices on the local network using Who-Is.
//!
//! Usage:
//!   BACFLOW_IFACE=eth0 cargo run -p bacflow-client --example discover_devices

use bacflow_client::BacnetClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let interface = std::env::var("BACFLOW_IFACE").unwrap_or_else(|_| "eth0".into());
    let client = BacnetClient::new(&interface, 47808).await?;

    // Collects I-Am replies until two seconds pass without a new one.
    let devices = client.who_is(None).await?;

    if devices.is_empty() {
        println!("No devices found.");
    } else {
        for device in &devices {
            println!("Device {} at {}", device.instance(), device.address);
        }
        println!("\nDiscovered {} device(s).", devices.len());
    }

    Ok(())
}
