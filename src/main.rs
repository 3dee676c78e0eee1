use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datafeed::config::Config;
use datafeed::{ApiClient, Entry, EntryMap};
use std::path::{Path, PathBuf};

/// Get the default config file path (~/.config/datafeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("datafeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "datafeed", about = "Read and write site datafeed entries")]
struct Args {
    /// Config file (defaults to ~/.config/datafeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Site id, overrides `site_id` from the config file
    #[arg(long, value_name = "ID", global = true)]
    site: Option<String>,

    /// API base URL, overrides `base_url` from the config file
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one entry, or several when more than one key is given
    Get {
        feed: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Store a single entry
    Add {
        feed: String,
        key: String,
        /// Time to live in seconds
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        ttl: i64,
        /// Entry values as a JSON object
        #[arg(long, default_value = "{}")]
        values: String,
    },
    /// Store every entry from a JSON array file
    Import { feed: String, file: PathBuf },
    /// Delete one entry, or several when more than one key is given
    Delete {
        feed: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

fn read_entries(path: &Path) -> Result<Vec<Entry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entries file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Entries file is not a JSON array of entries: {}", path.display()))
}

fn print_map(map: &EntryMap) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(map)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(site) = args.site {
        config.site_id = Some(site);
    }
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let settings = config.client_settings()?;
    let http = config
        .http_client()
        .context("Failed to build HTTP client")?;
    let client = ApiClient::new(http, settings).context("Failed to create API client")?;
    let feeds = client.datafeeds();

    match args.command {
        Command::Get { feed, keys } => {
            let map = match keys.as_slice() {
                [key] => feeds.get_entry(&feed, key).await?,
                _ => feeds.get_entries(&feed, &keys).await?,
            };
            print_map(&map)?;
        }
        Command::Add {
            feed,
            key,
            ttl,
            values,
        } => {
            let values: EntryMap =
                serde_json::from_str(&values).context("--values must be a JSON object")?;
            let entry = Entry { key, values, ttl };
            feeds.add_entry(&feed, &entry).await?;
            tracing::info!(feed = %feed, key = %entry.key, "Entry stored");
        }
        Command::Import { feed, file } => {
            let entries = read_entries(&file)?;
            feeds.add_entries(&feed, &entries).await?;
            println!("Imported {} entries into {}", entries.len(), feed);
        }
        Command::Delete { feed, keys } => {
            match keys.as_slice() {
                [key] => feeds.delete_entry(&feed, key).await?,
                _ => feeds.delete_entries(&feed, &keys).await?,
            }
            tracing::info!(feed = %feed, keys = keys.len(), "Entries deleted");
        }
    }

    Ok(())
}
