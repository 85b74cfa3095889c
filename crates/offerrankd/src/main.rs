//! offerrankd: operator CLI for the offer ranking engine.
//!
//! Ranks an offer snapshot against the local task store, exactly as the
//! scheduling loop would, and manages the store's task records.
//!
//! # Usage
//!
//! ```text
//! offerrankd import-tasks --data-dir /var/lib/offerrank --file tasks.json
//! offerrankd census --data-dir /var/lib/offerrank
//! offerrankd rank --config ranking.toml --data-dir /var/lib/offerrank \
//!     --offers offers.json --job www-data/prod/hello --cpus 0.5 --ram-mb 256
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use offerrank_core::{HostOffer, RankingConfig, ResourceRequest, TaskGroupKey};
use offerrank_engine::{OfferCollection, RankingOrchestrator, census};
use offerrank_metrics::render_prometheus;
use offerrank_state::{StateStore, TaskRecord};

const DEFAULT_LOG_FILTER: &str = "info,offerrankd=debug,offerrank=debug";
const STORE_FILE: &str = "offerrank.redb";

#[derive(Parser)]
#[command(name = "offerrankd", about = "Offer ranking engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Order an offer snapshot for one task group.
    Rank {
        /// Ranking configuration (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory holding the task store.
        #[arg(long, default_value = "/var/lib/offerrank")]
        data_dir: PathBuf,

        /// JSON array of offers, in snapshot order.
        #[arg(long)]
        offers: PathBuf,

        /// Task group key as role/environment/name.
        #[arg(long)]
        job: String,

        #[arg(long, default_value = "1.0")]
        cpus: f64,

        #[arg(long, default_value = "128")]
        ram_mb: u64,

        #[arg(long, default_value = "128")]
        disk_mb: u64,

        #[arg(long, default_value = "0")]
        ports: u32,
    },

    /// Print starting tasks per host.
    Census {
        #[arg(long, default_value = "/var/lib/offerrank")]
        data_dir: PathBuf,
    },

    /// Load task records from a JSON array into the store.
    ImportTasks {
        #[arg(long, default_value = "/var/lib/offerrank")]
        data_dir: PathBuf,

        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Rank {
            config,
            data_dir,
            offers,
            job,
            cpus,
            ram_mb,
            disk_mb,
            ports,
        } => {
            let resources = ResourceRequest {
                num_cpus: cpus,
                ram_mb,
                disk_mb,
                num_ports: ports,
            };
            run_rank(config.as_deref(), &data_dir, &offers, &job, resources).await
        }
        Command::Census { data_dir } => run_census(&data_dir),
        Command::ImportTasks { data_dir, file } => run_import(&data_dir, &file),
    }
}

fn open_store(data_dir: &Path) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let db_path = data_dir.join(STORE_FILE);
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "task store opened");
    Ok(store)
}

async fn run_rank(
    config: Option<&Path>,
    data_dir: &Path,
    offers: &Path,
    job: &str,
    resources: ResourceRequest,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => RankingConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RankingConfig::default(),
    };
    let key = TaskGroupKey::parse(job)
        .with_context(|| format!("job key must be role/environment/name, got {job:?}"))?;

    let raw = std::fs::read_to_string(offers)
        .with_context(|| format!("reading offers {}", offers.display()))?;
    let offers: Vec<HostOffer> = serde_json::from_str(&raw)?;
    let snapshot = Arc::new(OfferCollection::new(offers));
    info!(offers = snapshot.len(), hosts = snapshot.host_count(), "offer snapshot loaded");

    let store = Arc::new(open_store(data_dir)?);
    let orchestrator = RankingOrchestrator::new(&config, snapshot, store)?;

    for offer in orchestrator.get_ordered(&key, &resources).await {
        println!("{} {}", offer.offer_id, offer.hostname);
    }

    debug!(exposition = %render_prometheus(orchestrator.metrics()), "ranking metrics");
    Ok(())
}

fn run_census(data_dir: &Path) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let census = census(&store)?;

    let mut hosts: Vec<(&str, u32)> = census.iter().collect();
    hosts.sort_unstable();
    for (host, count) in hosts {
        println!("{host} {count}");
    }
    Ok(())
}

fn run_import(data_dir: &Path, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading tasks {}", file.display()))?;
    let tasks: Vec<TaskRecord> = serde_json::from_str(&raw)?;

    let store = open_store(data_dir)?;
    store.put_tasks(&tasks)?;
    info!(count = tasks.len(), "tasks imported");
    Ok(())
}
