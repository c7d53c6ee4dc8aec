use bacflow_core::services::write_property::WritePropertyRequest;
use bacflow_core::types::{ObjectId, PropertyId};
use bacflow_tools::{parse_object_id, parse_property, InterfaceArgs, TargetArgs, ValueKind};
use clap::Parser;

/// Writes one property.
#[derive(Parser, Debug)]
#[command(name = "bacflow-writeprop")]
struct Args {
    #[command(flatten)]
    interface: InterfaceArgs,
    #[command(flatten)]
    target: TargetArgs,
    #[arg(long, value_parser = parse_object_id)]
    object: ObjectId,
    #[arg(long, short = 'p', value_parser = parse_property, default_value = "present-value")]
    property: PropertyId,
    #[arg(long, value_enum)]
    kind: ValueKind,
    /// The value, parsed according to `--kind`.
    #[arg(long, default_value = "")]
    value: String,
    /// Command priority 1-16.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    priority: Option<u8>,
    #[arg(long)]
    index: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let value = args.kind.parse(&args.value)?;
    let client = args.interface.connect().await?;
    let device = args.target.device()?;

    client
        .write_property(
            &device,
            WritePropertyRequest {
                object_id: args.object,
                property_id: args.property,
                value: value.as_data_value(),
                array_index: args.index,
                priority: args.priority,
                invoke_id: 0,
            },
        )
        .await?;
    println!("ok");
    Ok(())
}
