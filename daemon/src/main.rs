//! tonidx daemon: schema bootstrap and read-side queries over the stores.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tonidx_abi::OperationRegistry;
use tonidx_indexer::{init_logging, IndexerConfig};
use tonidx_repository::Repositories;
use tonidx_store_lmdb::{LmdbAnalyticalStore, LmdbRelationalStore, Migrator};
use tonidx_types::{BlockFilter, BlockId, Hash256};

#[derive(Parser)]
#[command(name = "tonidx-daemon", about = "Blockchain indexer stores and queries")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TONIDX_CONFIG")]
    config: Option<PathBuf>,

    /// Root directory of the analytical and relational stores.
    #[arg(long, env = "TONIDX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TONIDX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TONIDX_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create every table and index and stamp the schema version.
    Init,

    /// Print the most recent indexed master block.
    LastBlock,

    /// Print blocks matching a filter, newest first.
    Blocks(BlocksArgs),
}

#[derive(clap::Args)]
struct BlocksArgs {
    /// Exact block identity, "workchain:shard_hex:seq_no".
    #[arg(long)]
    id: Option<BlockId>,

    /// Workchain; ignored when --id is given.
    #[arg(long, allow_negative_numbers = true)]
    workchain: Option<i32>,

    /// File hash, hex.
    #[arg(long)]
    file_hash: Option<Hash256>,

    #[arg(long)]
    with_master: bool,

    #[arg(long)]
    with_shards: bool,

    #[arg(long)]
    with_transactions: bool,

    /// Load transaction messages; implies --with-transactions.
    #[arg(long)]
    with_messages: bool,

    #[arg(long, default_value_t = 0)]
    offset: usize,

    #[arg(long, default_value_t = 20)]
    limit: usize,
}

impl BlocksArgs {
    fn filter(&self) -> BlockFilter {
        BlockFilter {
            id: self.id,
            workchain: self.workchain,
            file_hash: self.file_hash,
            with_master: self.with_master,
            with_shards: self.with_shards,
            with_transactions: self.with_transactions || self.with_messages,
            with_transaction_messages: self.with_messages,
        }
    }
}

type LmdbRepositories = Repositories<LmdbAnalyticalStore, LmdbRelationalStore>;

fn load_config(cli: &Cli) -> anyhow::Result<IndexerConfig> {
    let mut config = match &cli.config {
        Some(path) => IndexerConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => IndexerConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

fn open_stores(config: &IndexerConfig) -> anyhow::Result<(Arc<LmdbAnalyticalStore>, Arc<LmdbRelationalStore>)> {
    let analytical = LmdbAnalyticalStore::open(&config.analytical_path(), config.analytical_map_size)
        .context("failed to open analytical store")?;
    let relational = LmdbRelationalStore::open(&config.relational_path(), config.relational_map_size)
        .context("failed to open relational store")?;
    Ok((Arc::new(analytical), Arc::new(relational)))
}

fn init(config: &IndexerConfig) -> anyhow::Result<()> {
    let (analytical, relational) = open_stores(config)?;
    Migrator::run(&relational).context("schema migration failed")?;
    tonidx_repository::create_all_tables(analytical, relational)
        .context("schema bootstrap failed")?;

    if let Some(path) = &config.operations_file {
        let registry = OperationRegistry::from_toml_file(path)
            .with_context(|| format!("invalid operations file {}", path.display()))?;
        tracing::info!(operations = registry.len(), path = %path.display(), "operation registry checked");
    }

    tracing::info!(data_dir = %config.data_dir.display(), "stores initialised");
    Ok(())
}

fn repositories(config: &IndexerConfig) -> anyhow::Result<LmdbRepositories> {
    let (analytical, relational) = open_stores(config)?;
    Ok(Repositories::new(analytical, relational))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level)?;

    match &cli.command {
        Command::Init => init(&config)?,
        Command::LastBlock => {
            let repos = repositories(&config)?;
            let block = repos
                .blocks
                .get_last_master_block()
                .context("failed to read last master block")?;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
        Command::Blocks(args) => {
            let repos = repositories(&config)?;
            let blocks = repos
                .blocks
                .get_blocks(&args.filter(), args.offset, args.limit)
                .context("block query failed")?;
            tracing::debug!(count = blocks.len(), "blocks loaded");
            println!("{}", serde_json::to_string_pretty(&blocks)?);
        }
    }
    Ok(())
}
