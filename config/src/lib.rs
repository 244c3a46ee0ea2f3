//! # Publisher configuration
//!
//! Settings are layered the same way for every entry point:
//!
//! 1. the embedded `default-config.yaml`,
//! 2. a user file (an explicit path, or `config.yaml` in [`get_config_dir`]),
//! 3. `BUILDFLUX_*` environment variables (`__` separates nested keys, e.g.
//!    `BUILDFLUX_HTTP__TIMEOUT_SECS=5`).

#[macro_use]
extern crate tracing;

mod app_config;
mod proxy;
mod secret;
mod target;

pub use app_config::get_config_dir;
pub use proxy::{
    HttpSettings,
    ProxySettings,
};
pub use secret::Secret;
pub use target::Target;

use eyre::{
    Context as _,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeMap,
    path::Path,
};

/// Measurement used for the basic build metadata when no override is configured.
pub const DEFAULT_MEASUREMENT_NAME: &str = "jenkins_data";

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxySettings>,
    #[serde(default)]
    pub http: HttpSettings,
    /// Replaces the project name in every point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_project_name: Option<String>,
    /// Prepended to the project name, e.g. to tell apart multibranch jobs all named `master`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prefix: Option<String>,
    #[serde(default = "default_measurement_name")]
    pub measurement_name: String,
    /// `my-tag` becomes `my_tag` in tag values.
    #[serde(default)]
    pub replace_dash_with_underscore: bool,
    /// Newline separated `name=value` entries added as fields to the build metadata point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_parameter_field: Option<String>,
    /// Newline separated `name=value` entries added as tags to the build metadata point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_parameter_tag: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data_tags: BTreeMap<String, String>,
    /// Measurement name -> fields; each entry becomes its own `custom_<name>` point.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data_map: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data_map_tags: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_measurement_name() -> String {
    DEFAULT_MEASUREMENT_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            proxy: None,
            http: HttpSettings::default(),
            custom_project_name: None,
            custom_prefix: None,
            measurement_name: default_measurement_name(),
            replace_dash_with_underscore: false,
            env_parameter_field: None,
            env_parameter_tag: None,
            custom_data: BTreeMap::new(),
            custom_data_tags: BTreeMap::new(),
            custom_data_map: BTreeMap::new(),
            custom_data_map_tags: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads the layered configuration. With `path` the file must exist, otherwise the user file in the config
    /// directory is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).format(config::FileFormat::Yaml).required(true),
            None => {
                let path = get_config_dir().join("config.yaml");
                debug!(?path, "looking for user configuration");
                config::File::from(path).format(config::FileFormat::Yaml).required(false)
            }
        };

        let cfg = Self::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("BUILDFLUX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>())
            .wrap_err_with(|| format!("Failed to load configuration (file: {path:?})"))?;

        info!(targets = cfg.targets.len(), "configuration loaded");
        Ok(cfg)
    }

    /// Defaults overlaid with the given YAML document, without consulting the environment.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Yaml))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>())
            .context("Failed to parse configuration")
    }

    fn builder() -> config::ConfigBuilder<config::builder::DefaultState> {
        config::Config::builder().add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
    }

    /// The effective configuration with secrets masked.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).context("Failed to serialize config")
    }

    pub fn custom_prefix(&self) -> Option<&str> {
        self.custom_prefix.as_deref().filter(|prefix| !prefix.is_empty())
    }

    pub fn custom_project_name(&self) -> Option<&str> {
        self.custom_project_name.as_deref().filter(|name| !name.is_empty())
    }
}
