//! ttlkv demo
//!
//! A small driver that walks through the public API: it stores a value,
//! reads it back, deletes it, and reads it again, logging every step.

use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ttlkv::{StoreConfig, TtlStore};

/// Demo configuration
struct Config {
    /// TTL for the demo key
    ttl: Duration,
    /// Interval between background sweeps
    sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--ttl" | "-t" => {
                    config.ttl = Duration::from_secs(parse_value(&args, i, "--ttl"));
                    i += 2;
                }
                "--sweep-interval" | "-s" => {
                    config.sweep_interval =
                        Duration::from_millis(parse_value(&args, i, "--sweep-interval"));
                    i += 2;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ttlkv version {}", ttlkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }
}

/// Reads the numeric value following the flag at `i`, exiting on failure.
fn parse_value(args: &[String], i: usize, flag: &str) -> u64 {
    let Some(raw) = args.get(i + 1) else {
        eprintln!("Error: {} requires a value", flag);
        std::process::exit(1);
    };

    raw.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value for {}: {}", flag, raw);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
ttlkv - In-Process Key-Value Store with TTL Expiry (demo)

USAGE:
    ttlkv [OPTIONS]

OPTIONS:
    -t, --ttl <SECONDS>             TTL for the demo key (default: 5, 0 = store default)
    -s, --sweep-interval <MILLIS>   Interval between background sweeps (default: 1000)
    -v, --version                   Print version information
    -h, --help                      Print this help message

LOGGING:
    Set RUST_LOG to change verbosity, e.g. RUST_LOG=ttlkv=debug
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    let store = TtlStore::with_config(
        StoreConfig::default().with_sweep_interval(config.sweep_interval),
    );

    let key = "example1";
    let value = "some value";

    info!(key, value, ttl_secs = config.ttl.as_secs(), "Setting value");
    store.set(key, value, config.ttl);

    info!(key, "Retrieving value");
    match store.get(key) {
        Ok(found) => info!(key, value = found, "Value retrieved"),
        Err(e) => warn!(key, error = %e, "Lookup failed"),
    }

    info!(key, "Deleting value");
    store.delete(key);

    info!(key, "Retrieving value");
    match store.get(key) {
        Ok(found) => info!(key, value = found, "Value retrieved"),
        Err(e) => info!(key, error = %e, "Lookup failed"),
    }

    let stats = store.stats();
    info!(
        keys = stats.keys,
        get_ops = stats.get_ops,
        set_ops = stats.set_ops,
        del_ops = stats.del_ops,
        "Store statistics"
    );

    store.shutdown().await;
    info!("Demo complete");
    Ok(())
}
