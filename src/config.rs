use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

/// Table under which [GraphConfig] lives in a TOML config file.
pub const GRAPH_TABLE: &str = "graph";

/// Runtime settings of a [crate::store::Store] and the hydrators reading from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Capacity of the commit notification channel. Subscribers lagging further behind than
    /// this miss notices.
    pub notify_capacity: usize,
    /// Cross-check the reverse index against a linear scan after every commit.
    pub verify_index: bool,
    /// Whether hydrators built with [crate::hydrate::Hydrator::from_config] cache relation
    /// results.
    pub cache_relations: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            notify_capacity: 64,
            verify_index: false,
            cache_relations: true,
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn get_graph_config(&self) -> Result<GraphConfig, GraphError>;
    fn set_graph_config(&self, config: &GraphConfig) -> Result<(), GraphError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_graph_config(&self) -> Result<GraphConfig, GraphError> {
        tracing::debug!("Attempting to read graph config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using default graph config.");
            return Ok(GraphConfig::default());
        }
        let content = read_to_string(&self.path)?;
        let mut config: BTreeMap<String, GraphConfig> = toml::from_str(&content)?;
        Ok(config.remove(GRAPH_TABLE).unwrap_or_default())
    }

    fn set_graph_config(&self, config: &GraphConfig) -> Result<(), GraphError> {
        tracing::debug!("Attempting to write graph config to: {:?}", &self.path);
        let mut tables = BTreeMap::new();
        tables.insert(GRAPH_TABLE.to_string(), config.clone());
        let toml_string = toml::to_string(&tables)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}
