use bacflow_datalink::list_interfaces;
use clap::Parser;

/// Lists the IPv4 interfaces BACnet/IP can bind to.
#[derive(Parser, Debug)]
#[command(name = "bacflow-ifaces")]
struct Args {
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let interfaces = list_interfaces()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&interfaces)?);
        return Ok(());
    }
    for iface in &interfaces {
        println!(
            "{:<12} {:<15} mask {:<15} broadcast {}",
            iface.name, iface.address, iface.netmask, iface.broadcast
        );
    }
    Ok(())
}
