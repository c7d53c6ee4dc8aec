use bacflow_core::types::{ObjectId, PropertyId};
use bacflow_tools::{parse_object_id, parse_property, InterfaceArgs, TargetArgs};
use clap::Parser;

/// Reads one property.
#[derive(Parser, Debug)]
#[command(name = "bacflow-readprop")]
struct Args {
    #[command(flatten)]
    interface: InterfaceArgs,
    #[command(flatten)]
    target: TargetArgs,
    /// `TYPE:INSTANCE`; the target device object when omitted.
    #[arg(long, value_parser = parse_object_id)]
    object: Option<ObjectId>,
    /// Property name or number.
    #[arg(long, short = 'p', value_parser = parse_property, default_value = "present-value")]
    property: PropertyId,
    /// Array index; 0 reads the array length.
    #[arg(long)]
    index: Option<u32>,
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let client = args.interface.connect().await?;
    let device = args.target.device()?;
    let object = args.object.unwrap_or(device.device_id);

    let value = match args.index {
        Some(index) => {
            client
                .read_property_indexed(&device, object, args.property, index)
                .await?
        }
        None => client.read_property(&device, object, args.property).await?,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{object:?} {}: {value:?}", args.property);
    }
    Ok(())
}
