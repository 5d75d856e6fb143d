use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};

use crate::{
    storage::{self, StorageManager},
    tag_tree::ALL_PATH,
};

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8787";
const DEFAULT_DATA_FILE: &str = "data.json";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Address the HTTP API binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Entries document, relative to the base path
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Directory served at `/` next to the API (e.g. a web frontend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,

    /// Tree path `search` starts from when `--path` is not given
    #[serde(default = "default_path")]
    pub default_path: String,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            data_file: default_data_file(),
            static_dir: None,
            default_path: default_path(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

fn default_path() -> String {
    ALL_PATH.to_string()
}

/// `TAGMARK_BASE_PATH`, else `~/.local/share/tagmark`.
pub fn base_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("TAGMARK_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }
    let home = homedir::my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(home.join(".local/share/tagmark"))
}

impl Config {
    fn validate(&mut self) -> anyhow::Result<()> {
        if self.listen_addr.trim().is_empty() {
            self.listen_addr = default_listen_addr();
        }
        if self.data_file.trim().is_empty() {
            self.data_file = default_data_file();
        }
        if self.default_path.trim().is_empty() {
            self.default_path = default_path();
        }

        if self.listen_addr.parse::<SocketAddr>().is_err() {
            bail!(
                "listen_addr must be an ip:port socket address, got '{}'",
                self.listen_addr
            );
        }

        Ok(())
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(base_path()?)
    }

    pub fn load_with(base_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let base_path = base_path.into();
        let store = storage::BackendLocal::new(&base_path)
            .with_context(|| format!("cannot create {}", base_path.display()))?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            log::info!("writing default config to {}", store.path_of(CONFIG_FILE).display());
            store.write(CONFIG_FILE, serde_yml::to_string(&Self::default())?.as_bytes())?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)
            .context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path;
        config.validate()?;

        // resave when defaults were filled in
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;
        store.write(CONFIG_FILE, serde_yml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    pub fn storage(&self) -> std::io::Result<storage::BackendLocal> {
        storage::BackendLocal::new(&self.base_path)
    }
}
