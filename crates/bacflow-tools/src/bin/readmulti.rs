use bacflow_core::services::read_property_multiple::{PropertyReference, ReadAccessSpecification};
use bacflow_core::types::{ObjectId, PropertyId};
use bacflow_tools::{parse_object_id, parse_property, write_json, InterfaceArgs, TargetArgs};
use clap::Parser;
use std::path::PathBuf;

/// Reads several properties of several objects in one request.
#[derive(Parser, Debug)]
#[command(name = "bacflow-readmulti")]
struct Args {
    #[command(flatten)]
    interface: InterfaceArgs,
    #[command(flatten)]
    target: TargetArgs,
    /// `TYPE:INSTANCE`, repeatable.
    #[arg(long, required = true, value_parser = parse_object_id)]
    object: Vec<ObjectId>,
    /// Property names or numbers, comma separated.
    #[arg(
        long,
        short = 'p',
        value_delimiter = ',',
        value_parser = parse_property,
        default_value = "object-name,present-value"
    )]
    property: Vec<PropertyId>,
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let client = args.interface.connect().await?;
    let device = args.target.device()?;

    let refs: Vec<PropertyReference> = args
        .property
        .iter()
        .copied()
        .map(PropertyReference::new)
        .collect();
    let specs: Vec<ReadAccessSpecification<'_>> = args
        .object
        .iter()
        .map(|&object_id| ReadAccessSpecification {
            object_id,
            properties: &refs,
        })
        .collect();
    let reads = client.read_property_multiple(&device, &specs).await?;
    write_json(&reads, args.output.as_ref())
}
