use std::time::Duration;

use clap::{Parser, Subcommand};

use s3_caching_proxy::cache::Target;
use s3_caching_proxy::config::{StoreArgs, StoreConfig};
use s3_caching_proxy::ObjectStoreClient;

#[derive(Parser)]
#[command(name = "cache-cli")]
#[command(about = "Inspect the S3 caching proxy's bucket", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cache key and store URL for a target URL
    Key { url: String },
    /// Check whether a target URL is already cached
    Probe { url: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut store = StoreConfig::default();
    cli.store.apply(&mut store);
    let client = ObjectStoreClient::new(&store, Duration::from_secs(cli.connect_timeout))?;

    match cli.command {
        Commands::Key { url } => {
            let target = Target::from_request_path(&url)?;
            let key = target.cache_key();
            let location = client.locate(key.as_str())?;
            println!("key:       {}", key);
            println!("store url: {}", location);
        }
        Commands::Probe { url } => {
            let target = Target::from_request_path(&url)?;
            let location = client.locate(target.cache_key().as_str())?;
            let status = client.probe(&location).await?;
            if status.is_success() {
                println!("cached     {} ({})", location, status);
            } else {
                println!("not cached {} ({})", location, status);
            }
        }
    }

    Ok(())
}
