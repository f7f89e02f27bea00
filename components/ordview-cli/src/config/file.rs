use ordview::config::{
    BitcoinNetwork, ChainhookConfig, Config, HttpApiConfig, IngestionConfig, LogConfig,
    NumberingMode, StorageConfig,
};
use std::fs::File;
use std::io::{BufReader, Read};

#[derive(Deserialize, Debug, Clone)]
pub struct ConfigFile {
    pub storage: Option<StorageConfigFile>,
    pub http_api: Option<HttpApiConfigFile>,
    pub chainhook: Option<ChainhookConfigFile>,
    pub ingestion: Option<IngestionConfigFile>,
    pub network: Option<NetworkConfigFile>,
    pub logs: Option<LogConfigFile>,
}

impl ConfigFile {
    pub fn from_file_path(file_path: &str) -> Result<Config, String> {
        let file = File::open(file_path)
            .map_err(|e| format!("unable to read file {}\n{:?}", file_path, e))?;
        let mut file_reader = BufReader::new(file);
        let mut file_buffer = vec![];
        file_reader
            .read_to_end(&mut file_buffer)
            .map_err(|e| format!("unable to read file {}\n{:?}", file_path, e))?;

        let config_file: ConfigFile = match toml::from_slice(&file_buffer) {
            Ok(s) => s,
            Err(e) => {
                return Err(format!("Config file malformatted {}", e.to_string()));
            }
        };
        ConfigFile::from_config_file(config_file)
    }

    /// Missing sections and keys fall back to the preset of the selected network.
    pub fn from_config_file(config_file: ConfigFile) -> Result<Config, String> {
        let network = match config_file.network.as_ref().and_then(|n| n.mode.as_ref()) {
            Some(mode) => mode.parse::<BitcoinNetwork>()?,
            None => BitcoinNetwork::Mainnet,
        };
        let defaults = match network {
            BitcoinNetwork::Mainnet => Config::mainnet_default(),
            BitcoinNetwork::Testnet => Config::testnet_default(),
            BitcoinNetwork::Regtest | BitcoinNetwork::Signet => {
                let mut config = Config::devnet_default();
                config.network = network;
                config
            }
        };

        let storage = config_file.storage.unwrap_or_default();
        let http_api = config_file.http_api.unwrap_or_default();
        let chainhook = config_file.chainhook.unwrap_or_default();
        let ingestion = config_file.ingestion.unwrap_or_default();
        let logs = config_file.logs.unwrap_or_default();

        let numbering = match ingestion.numbering {
            Some(ref numbering) => numbering.parse::<NumberingMode>()?,
            None => defaults.ingestion.numbering,
        };

        let config = Config {
            storage: StorageConfig {
                working_dir: storage
                    .working_dir
                    .unwrap_or(defaults.storage.working_dir),
            },
            http_api: HttpApiConfig {
                http_port: http_api.http_port.unwrap_or(defaults.http_api.http_port),
                workers: http_api
                    .workers
                    .unwrap_or(defaults.http_api.workers)
                    .max(1),
                display_logs: http_api
                    .display_logs
                    .unwrap_or(defaults.http_api.display_logs),
            },
            chainhook: ChainhookConfig {
                predicate_uuid: chainhook
                    .predicate_uuid
                    .unwrap_or(defaults.chainhook.predicate_uuid),
                node_auth_token: chainhook
                    .node_auth_token
                    .unwrap_or(defaults.chainhook.node_auth_token),
                node_rpc_url: chainhook
                    .node_rpc_url
                    .unwrap_or(defaults.chainhook.node_rpc_url),
                auto_predicate_registration: chainhook
                    .auto_predicate_registration
                    .unwrap_or(defaults.chainhook.auto_predicate_registration),
                external_base_url: chainhook
                    .external_base_url
                    .unwrap_or(defaults.chainhook.external_base_url),
            },
            ingestion: IngestionConfig { numbering },
            network,
            logs: LogConfig {
                ordinals_internals: logs
                    .ordinals_internals
                    .unwrap_or(defaults.logs.ordinals_internals),
            },
        };
        Ok(config)
    }

    pub fn default(
        devnet: bool,
        testnet: bool,
        mainnet: bool,
        config_path: &Option<String>,
    ) -> Result<Config, String> {
        let config = match (devnet, testnet, mainnet, config_path) {
            (true, false, false, _) => Config::devnet_default(),
            (false, true, false, _) => Config::testnet_default(),
            (false, false, true, _) => Config::mainnet_default(),
            (false, false, false, Some(config_path)) => ConfigFile::from_file_path(config_path)?,
            _ => Err("Invalid combination of arguments".to_string())?,
        };
        Ok(config)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LogConfigFile {
    pub ordinals_internals: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StorageConfigFile {
    pub working_dir: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct HttpApiConfigFile {
    pub http_port: Option<u16>,
    pub workers: Option<usize>,
    pub display_logs: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ChainhookConfigFile {
    pub predicate_uuid: Option<String>,
    pub node_auth_token: Option<String>,
    pub node_rpc_url: Option<String>,
    pub auto_predicate_registration: Option<bool>,
    pub external_base_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct IngestionConfigFile {
    pub numbering: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NetworkConfigFile {
    pub mode: Option<String>,
}
