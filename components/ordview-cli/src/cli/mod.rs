use crate::config::file::ConfigFile;
use crate::config::generator::generate_config;
use clap::{Parser, Subcommand};
use ordview::config::Config;
use ordview::core::pipeline::processors::chain_event_processing::process_chainhook_payload;
use ordview::core::protocol::inscription_normalizing::parse_chainhook_payload;
use ordview::db::queries::{count_unlinked_locations, get_inscription, get_transfers, Pagination};
use ordview::db::{
    delete_ordview_db, get_db_stats, initialize_ordview_db, open_readonly_ordview_db_conn,
};
use ordview::ord::inscription_id::InscriptionId;
use ordview::service::Service;
use ordview::utils::Context;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Generate a new configuration file
    #[clap(subcommand)]
    Config(ConfigCommand),
    /// Receive chainhook payloads and serve the inscriptions API
    #[clap(subcommand)]
    Service(ServiceCommand),
    /// Inspect and maintain the local database
    #[clap(subcommand)]
    Db(OrdviewDbCommand),
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
#[clap(bin_name = "config", aliases = &["config"])]
enum ConfigCommand {
    /// Generate new config
    #[clap(name = "new", bin_name = "new", aliases = &["generate"])]
    New(NewConfig),
}

#[derive(Parser, PartialEq, Clone, Debug)]
struct NewConfig {
    /// Target Regtest network
    #[clap(
        long = "regtest",
        conflicts_with = "testnet",
        conflicts_with = "mainnet"
    )]
    pub regtest: bool,
    /// Target Testnet network
    #[clap(
        long = "testnet",
        conflicts_with = "regtest",
        conflicts_with = "mainnet"
    )]
    pub testnet: bool,
    /// Target Mainnet network
    #[clap(
        long = "mainnet",
        conflicts_with = "testnet",
        conflicts_with = "regtest"
    )]
    pub mainnet: bool,
}

/// Where the configuration comes from: a preset or a TOML file.
#[derive(Parser, PartialEq, Clone, Debug)]
struct ConfigSelection {
    /// Target Regtest network
    #[clap(
        long = "regtest",
        conflicts_with = "testnet",
        conflicts_with = "mainnet"
    )]
    pub regtest: bool,
    /// Target Testnet network
    #[clap(
        long = "testnet",
        conflicts_with = "regtest",
        conflicts_with = "mainnet"
    )]
    pub testnet: bool,
    /// Target Mainnet network
    #[clap(
        long = "mainnet",
        conflicts_with = "testnet",
        conflicts_with = "regtest"
    )]
    pub mainnet: bool,
    /// Load config file path
    #[clap(
        long = "config-path",
        conflicts_with = "mainnet",
        conflicts_with = "testnet",
        conflicts_with = "regtest"
    )]
    pub config_path: Option<String>,
}

impl ConfigSelection {
    fn load(&self) -> Result<Config, String> {
        ConfigFile::default(self.regtest, self.testnet, self.mainnet, &self.config_path)
    }
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum ServiceCommand {
    /// Start ordview
    #[clap(name = "start", bin_name = "start")]
    Start(StartCommand),
}

#[derive(Parser, PartialEq, Clone, Debug)]
struct StartCommand {
    #[clap(flatten)]
    pub config: ConfigSelection,
    /// Register the inscription feed predicate with the chainhook node before serving
    #[clap(long = "register-predicate")]
    pub register_predicate: bool,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum OrdviewDbCommand {
    /// Apply a chainhook payload file to the database
    #[clap(name = "ingest", bin_name = "ingest")]
    Ingest(IngestCommand),
    /// Display an inscription and its transfers
    #[clap(name = "inscription", bin_name = "inscription")]
    Inscription(InscriptionCommand),
    /// Display row counts
    #[clap(name = "stats", bin_name = "stats")]
    Stats(DbStatsCommand),
    /// Delete the database
    #[clap(name = "drop", bin_name = "drop")]
    Drop(DropOrdviewDbCommand),
}

#[derive(Parser, PartialEq, Clone, Debug)]
struct IngestCommand {
    /// Path of the JSON payload, as posted by a chainhook node
    pub payload_path: String,
    #[clap(flatten)]
    pub config: ConfigSelection,
}

#[derive(Parser, PartialEq, Clone, Debug)]
struct InscriptionCommand {
    /// Inscription Id
    pub inscription_id: String,
    #[clap(flatten)]
    pub config: ConfigSelection,
}

#[derive(Parser, PartialEq, Clone, Debug)]
struct DbStatsCommand {
    #[clap(flatten)]
    pub config: ConfigSelection,
}

#[derive(Parser, PartialEq, Clone, Debug)]
struct DropOrdviewDbCommand {
    #[clap(flatten)]
    pub config: ConfigSelection,
}

pub fn main() {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    let ctx = Context {
        logger: Some(logger),
        tracer: false,
    };

    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            println!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = hiro_system_kit::nestable_block_on(handle_command(opts, &ctx)) {
        error!(ctx.expect_logger(), "{e}");
        std::thread::sleep(std::time::Duration::from_millis(500));
        process::exit(1);
    }
}

async fn handle_command(opts: Opts, ctx: &Context) -> Result<(), String> {
    match opts.command {
        Command::Service(ServiceCommand::Start(cmd)) => {
            let mut config = cmd.config.load()?;
            if cmd.register_predicate {
                config.chainhook.auto_predicate_registration = true;
            }
            info!(
                ctx.expect_logger(),
                "Starting ordview {} ({}) on {}, numbering: {:?}",
                env!("CARGO_PKG_VERSION"),
                option_env!("GIT_COMMIT").unwrap_or("unknown commit"),
                config.network,
                config.ingestion.numbering
            );
            let mut service = Service::new(config, ctx.clone());
            return service.run().await;
        }
        Command::Config(subcmd) => match subcmd {
            ConfigCommand::New(cmd) => {
                use std::fs::File;
                use std::io::Write;
                let config = ConfigFile::default(cmd.regtest, cmd.testnet, cmd.mainnet, &None)?;
                let config_content = generate_config(&config);
                let mut file_path = PathBuf::new();
                file_path.push("Ordview.toml");
                let mut file = File::create(&file_path)
                    .map_err(|e| format!("unable to open file {}\n{}", file_path.display(), e))?;
                file.write_all(config_content.as_bytes())
                    .map_err(|e| format!("unable to write file {}\n{}", file_path.display(), e))?;
                println!("Created file Ordview.toml");
            }
        },
        Command::Db(OrdviewDbCommand::Ingest(cmd)) => {
            let config = cmd.config.load()?;
            let file = std::fs::File::open(&cmd.payload_path)
                .map_err(|e| format!("unable to read file {}\n{:?}", cmd.payload_path, e))?;
            let mut file_reader = BufReader::new(file);
            let mut file_buffer = vec![];
            file_reader
                .read_to_end(&mut file_buffer)
                .map_err(|e| format!("unable to read file {}\n{:?}", cmd.payload_path, e))?;
            let payload = parse_chainhook_payload(&file_buffer).map_err(|e| e.to_string())?;

            let mut conn = initialize_ordview_db(Some(&config.expected_cache_path()), ctx)?;
            let report =
                process_chainhook_payload(&payload, config.ingestion.numbering, &mut conn, ctx)
                    .map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?
            );
        }
        Command::Db(OrdviewDbCommand::Inscription(cmd)) => {
            let config = cmd.config.load()?;
            let inscription_id = cmd
                .inscription_id
                .parse::<InscriptionId>()
                .map_err(|e| format!("invalid inscription id {}: {e}", cmd.inscription_id))?
                .to_string();
            let conn = open_readonly_ordview_db_conn(&config.expected_cache_path(), ctx)?;
            match get_inscription(&inscription_id, &conn).map_err(|e| e.to_string())? {
                Some(inscription) => {
                    let mut transfers = vec![];
                    let mut pagination = Pagination::default();
                    loop {
                        let page = get_transfers(&inscription_id, &pagination, &conn)
                            .map_err(|e| e.to_string())?;
                        let fetched = page.results.len() as u32;
                        transfers.extend(page.results);
                        if fetched < pagination.limit {
                            break;
                        }
                        pagination.offset += fetched;
                    }
                    let output = serde_json::json!({
                        "inscription": inscription,
                        "transfers": transfers,
                    });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?
                    );
                }
                None => {
                    let pending = count_unlinked_locations(&inscription_id, &conn)
                        .map_err(|e| e.to_string())?;
                    warn!(
                        ctx.expect_logger(),
                        "Inscription {} not found ({} unlinked location(s) waiting for its reveal)",
                        inscription_id,
                        pending
                    );
                }
            }
        }
        Command::Db(OrdviewDbCommand::Stats(cmd)) => {
            let config = cmd.config.load()?;
            let conn = open_readonly_ordview_db_conn(&config.expected_cache_path(), ctx)?;
            let stats = get_db_stats(&conn).map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).map_err(|e| e.to_string())?
            );
        }
        Command::Db(OrdviewDbCommand::Drop(cmd)) => {
            let config = cmd.config.load()?;
            delete_ordview_db(&config.expected_cache_path(), ctx)?;
            info!(
                ctx.expect_logger(),
                "Database {} dropped",
                config.expected_db_file_path().display()
            );
        }
    }
    Ok(())
}
