use std::{fmt, path::PathBuf, str::FromStr};

use rand::{thread_rng, Rng};

pub const DEFAULT_HTTP_PORT: u16 = 20455;
pub const DEFAULT_CHAINHOOK_NODE_RPC_URL: &str = "http://localhost:20456";
pub const DEFAULT_EXTERNAL_BASE_URL: &str = "http://localhost:20455";
pub const DEFAULT_HTTP_WORKERS: usize = 4;

#[derive(Clone, Debug)]
pub struct Config {
    pub storage: StorageConfig,
    pub http_api: HttpApiConfig,
    pub chainhook: ChainhookConfig,
    pub ingestion: IngestionConfig,
    pub network: BitcoinNetwork,
    pub logs: LogConfig,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub ordinals_internals: bool,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub working_dir: String,
}

#[derive(Clone, Debug)]
pub struct HttpApiConfig {
    pub http_port: u16,
    pub workers: usize,
    pub display_logs: bool,
}

#[derive(Clone, Debug)]
pub struct ChainhookConfig {
    pub predicate_uuid: String,
    pub node_auth_token: String,
    pub node_rpc_url: String,
    pub auto_predicate_registration: bool,
    pub external_base_url: String,
}

#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub numbering: NumberingMode,
}

/// Where inscription numbers come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberingMode {
    /// Allocated locally from the `inscriptions` table sequence, never reused.
    Sequence,
    /// Taken from the payload's `inscription_number`.
    Upstream,
}

impl FromStr for NumberingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequence" => Ok(NumberingMode::Sequence),
            "upstream" => Ok(NumberingMode::Upstream),
            _ => Err(format!("numbering mode '{s}' unsupported (sequence, upstream)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitcoinNetwork {
    Mainnet,
    Testnet,
    Regtest,
    Signet,
}

impl BitcoinNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            BitcoinNetwork::Mainnet => "mainnet",
            BitcoinNetwork::Testnet => "testnet",
            BitcoinNetwork::Regtest => "regtest",
            BitcoinNetwork::Signet => "signet",
        }
    }

    pub fn first_inscription_height(&self) -> u64 {
        match self {
            BitcoinNetwork::Mainnet => 767430,
            BitcoinNetwork::Regtest => 1,
            BitcoinNetwork::Testnet => 2413343,
            BitcoinNetwork::Signet => 112402,
        }
    }
}

impl fmt::Display for BitcoinNetwork {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BitcoinNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(BitcoinNetwork::Mainnet),
            "testnet" => Ok(BitcoinNetwork::Testnet),
            "regtest" | "devnet" => Ok(BitcoinNetwork::Regtest),
            "signet" => Ok(BitcoinNetwork::Signet),
            _ => Err(format!("network '{s}' unsupported")),
        }
    }
}

impl Config {
    pub fn expected_cache_path(&self) -> PathBuf {
        let mut destination_path = PathBuf::new();
        destination_path.push(&self.storage.working_dir);
        destination_path
    }

    pub fn expected_db_file_path(&self) -> PathBuf {
        crate::db::get_default_ordview_db_file_path(&self.expected_cache_path())
    }

    pub fn chainhook_ingestion_url(&self) -> String {
        format!(
            "{}/chainhook/{}",
            self.chainhook.external_base_url.trim_end_matches('/'),
            self.chainhook.predicate_uuid
        )
    }

    fn default_for_network(network: BitcoinNetwork) -> Config {
        Config {
            storage: StorageConfig {
                working_dir: default_cache_path(),
            },
            http_api: HttpApiConfig {
                http_port: DEFAULT_HTTP_PORT,
                workers: num_cpus::get().min(DEFAULT_HTTP_WORKERS).max(1),
                display_logs: false,
            },
            chainhook: ChainhookConfig {
                predicate_uuid: generate_predicate_uuid(),
                node_auth_token: String::new(),
                node_rpc_url: DEFAULT_CHAINHOOK_NODE_RPC_URL.into(),
                auto_predicate_registration: false,
                external_base_url: DEFAULT_EXTERNAL_BASE_URL.into(),
            },
            ingestion: IngestionConfig {
                numbering: NumberingMode::Sequence,
            },
            network,
            logs: LogConfig {
                ordinals_internals: true,
            },
        }
    }

    pub fn devnet_default() -> Config {
        Config::default_for_network(BitcoinNetwork::Regtest)
    }

    pub fn testnet_default() -> Config {
        Config::default_for_network(BitcoinNetwork::Testnet)
    }

    pub fn mainnet_default() -> Config {
        Config::default_for_network(BitcoinNetwork::Mainnet)
    }
}

pub fn default_cache_path() -> String {
    let mut cache_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    cache_path.push("ordview");
    format!("{}", cache_path.display())
}

/// Random version 4 uuid, used when no predicate uuid is configured.
pub fn generate_predicate_uuid() -> String {
    let mut bytes: [u8; 16] = thread_rng().gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
