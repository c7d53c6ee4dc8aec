use bacflow_client::{BacnetClient, Device};
use bacflow_datalink::BacnetIpTransport;
use bacflow_tools::{split_range, write_json, InterfaceArgs};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Finds devices with Who-Is and optionally walks their objects.
#[derive(Parser, Debug)]
#[command(name = "bacflow-discover")]
struct Args {
    #[command(flatten)]
    interface: InterfaceArgs,
    /// Lowest device instance to ask for.
    #[arg(long, requires = "end")]
    start: Option<u32>,
    /// Highest device instance to ask for.
    #[arg(long, requires = "start")]
    end: Option<u32>,
    /// Parallel Who-Is ranges and device walks.
    #[arg(long, short = 'c', default_value_t = 4)]
    concurrency: usize,
    /// Also read every device's object list, names and descriptions.
    #[arg(long)]
    objects: bool,
    /// Write the JSON here instead of stdout.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let client = Arc::new(args.interface.connect().await?);

    let ranges = match (args.start, args.end) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(format!("--start {start} is above --end {end}").into());
            }
            split_range(start, end, args.concurrency)
                .into_iter()
                .map(Some)
                .collect()
        }
        _ => vec![None],
    };

    let mut scans = JoinSet::new();
    for range in ranges {
        let client = Arc::clone(&client);
        scans.spawn(async move { (range, client.who_is(range).await) });
    }
    let mut found = BTreeMap::new();
    while let Some(joined) = scans.join_next().await {
        let (range, result) = joined?;
        match result {
            Ok(devices) => {
                for device in devices {
                    found.entry(device.instance()).or_insert(device);
                }
            }
            Err(err) => eprintln!("who-is {range:?} failed: {err}"),
        }
    }
    log::info!("found {} devices", found.len());

    let mut devices: Vec<Device> = found.into_values().collect();
    if args.objects {
        devices = walk_all(&client, devices, args.concurrency.max(1)).await?;
    }
    write_json(&devices, args.output.as_ref())
}

async fn walk_all(
    client: &Arc<BacnetClient<BacnetIpTransport>>,
    devices: Vec<Device>,
    concurrency: usize,
) -> Result<Vec<Device>, Box<dyn std::error::Error>> {
    let mut walks = JoinSet::new();
    let mut walked = Vec::with_capacity(devices.len());
    for mut device in devices {
        if walks.len() >= concurrency {
            if let Some(done) = walks.join_next().await {
                walked.push(done?);
            }
        }
        let client = Arc::clone(client);
        walks.spawn(async move {
            if let Err(err) = client.objects(&mut device).await {
                eprintln!("device {}: object walk failed: {err}", device.instance());
            }
            device
        });
    }
    while let Some(done) = walks.join_next().await {
        walked.push(done?);
    }
    walked.sort_by_key(Device::instance);
    Ok(walked)
}
