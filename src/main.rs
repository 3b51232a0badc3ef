// ==========================================================
//  ipam - rack inventory and address-space dashboard
// ==========================================================

use ipam::{table, DeviceSort, Ipam, IpamConfig, IpamError, MemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

enum Command {
    Map,
    Scan,
    Ping { id: i64, address: Option<String> },
}

fn print_usage() {
    println!("Usage: ipam [COMMAND] [OPTIONS]");
    println!("Commands:");
    println!("  map                    show the address map and devices per rack (default)");
    println!("  scan                   sweep the managed subnet for live hosts");
    println!("  ping <ID> [IP]         ping one device");
    println!("Options:");
    println!("  --sort <ip|hostname>   order devices within each rack");
    println!("  --order <asc|desc>     sort direction (default: asc)");
    println!("  --store <FILE>         inventory snapshot (default: $DB_PATH or ipam.json)");
    println!("  -j, --jobs <N>         concurrent probes during a scan (default: 20)");
    println!("  --json                 print JSON instead of tables");
    println!("  -h, --help             show this help message");
}

#[tokio::main]
async fn main() -> Result<(), IpamError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ipam=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = IpamConfig::from_env();

    let raw_args: Vec<String> = std::env::args().collect();
    let mut args = raw_args.iter().skip(1);

    let mut sort_key: Option<String> = None;
    let mut sort_order: Option<String> = None;
    let mut json = false;
    let mut store_path: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();

    // Parse command line arguments
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sort" => sort_key = args.next().cloned(),
            "--order" => sort_order = args.next().cloned(),
            "--store" => store_path = args.next().map(PathBuf::from),
            "--jobs" | "-j" => {
                if let Some(jobs) = args.next().and_then(|s| s.parse().ok()) {
                    config.scan.set_concurrency(jobs);
                }
            }
            "--json" => json = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ => positional.push(arg.clone()),
        }
    }

    let command = match positional.first().map(String::as_str) {
        None | Some("map") => Command::Map,
        Some("scan") => Command::Scan,
        Some("ping") => {
            let id = positional
                .get(1)
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| IpamError::InvalidArgument("ping needs a numeric device id".to_string()))?;
            Command::Ping {
                id,
                address: positional.get(2).cloned(),
            }
        }
        Some(other) => {
            print_usage();
            return Err(IpamError::InvalidArgument(format!("unknown command '{}'", other)));
        }
    };

    if let Some(path) = store_path {
        config.store_path = path;
    }
    let store = MemoryStore::open(&config.store_path)?;
    let engine = Ipam::new(Arc::new(store), config);

    match command {
        Command::Map => {
            let dashboard = engine.dashboard(&DeviceSort::from_params(
                sort_key.as_deref(),
                sort_order.as_deref(),
            ))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                table::print_dashboard(&dashboard);
            }
        }
        Command::Scan => {
            let report = engine.scan().await?;
            if json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("{}", table::scan_table(&report));
                println!("{} host(s) responded", report.active_ips.len());
            }
        }
        Command::Ping { id, address } => {
            let report = engine.ping_device(id, address.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("{}", report.output);
                println!("{}", if report.success { "reachable" } else { "unreachable" });
            }
        }
    }

    Ok(())
}
