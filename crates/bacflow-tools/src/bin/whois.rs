use bacflow_core::types::Address;
use bacflow_datalink::ip_address;
use bacflow_tools::{parse_ip_endpoint, write_json, InterfaceArgs};
use clap::Parser;
use std::net::SocketAddrV4;
use std::path::PathBuf;

/// Sends one Who-Is, broadcast or to a single address, and prints the I-Ams.
#[derive(Parser, Debug)]
#[command(name = "bacflow-whois")]
struct Args {
    #[command(flatten)]
    interface: InterfaceArgs,
    /// Ask only this `IP[:PORT]` instead of broadcasting.
    #[arg(long, short = 'a', value_parser = parse_ip_endpoint)]
    address: Option<SocketAddrV4>,
    #[arg(long, requires = "end")]
    start: Option<u32>,
    #[arg(long, requires = "start")]
    end: Option<u32>,
    #[arg(long)]
    json: bool,
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let client = args.interface.connect().await?;
    let range = args.start.zip(args.end);
    let devices = match args.address {
        Some(endpoint) => {
            let address: Address = ip_address(endpoint);
            client.who_is_at(address, range).await?
        }
        None => client.who_is(range).await?,
    };
    if args.json || args.output.is_some() {
        return write_json(&devices, args.output.as_ref());
    }
    for device in &devices {
        println!(
            "device {:>7}  {}  vendor {}  max-apdu {}  {:?}",
            device.instance(),
            device.address,
            device.vendor_id,
            device.max_apdu,
            device.segmentation
        );
    }
    Ok(())
}
