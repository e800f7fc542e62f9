//! Layered configuration for the solver families and the orchestrator.
//!
//! Mirrors the teacher's `AccumulatorConfig`: deserialize a TOML file
//! (file-extension-dispatched, room for more formats later), or build a
//! config by hand with the [derive_builder]-generated [AppConfigBuilder].
//!
//! ```toml,ignore
//! cache_dir = "./.nodetrix-order-cache"
//! default_method = "heuristic"
//!
//! [exact]
//! time_limit_secs = 3600
//!
//! [heuristic]
//! seed = 0
//! max_passes = 3
//! max_random_restarts = 5
//!
//! [hybrid]
//! per_cluster_time_limit_secs = 60
//! ```

use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use derive_builder::Builder;
use log::debug;
use serde::Deserialize;

use crate::orchestrator::{Method, OrchestratorConfig};
use crate::solver::exact::ExactConfig;
use crate::solver::heuristic::HeuristicConfig;
use crate::solver::hybrid::HybridConfig;
use crate::utils::{IfNoneThen, LogOnErr};

/// On-disk, serde-facing mirror of [OrchestratorConfig]; durations are
/// expressed in seconds since [Duration] has no serde impl without extra
/// dependencies the rest of this crate doesn't otherwise need.
#[derive(Deserialize, Debug, Default, Builder)]
#[builder(default)]
pub struct AppConfig {
    #[builder(setter(strip_option))]
    pub cache_dir: Option<PathBuf>,
    #[builder(setter(strip_option))]
    pub default_method: Option<MethodConfig>,
    #[serde(default)]
    pub exact: ExactConfigFile,
    #[serde(default)]
    pub heuristic: HeuristicConfigFile,
    #[serde(default)]
    pub hybrid: HybridConfigFile,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MethodConfig {
    Input,
    Ilp,
    Heuristic,
    Hybrid,
}

impl From<MethodConfig> for Method {
    fn from(m: MethodConfig) -> Method {
        match m {
            MethodConfig::Input => Method::Input,
            MethodConfig::Ilp => Method::Ilp,
            MethodConfig::Heuristic => Method::Heuristic,
            MethodConfig::Hybrid => Method::Hybrid,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ExactConfigFile {
    pub time_limit_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct HeuristicConfigFile {
    pub seed: Option<u64>,
    pub max_passes: Option<usize>,
    pub max_random_restarts: Option<usize>,
    pub random_restart_max_group_size: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct HybridConfigFile {
    pub per_cluster_time_limit_secs: Option<u64>,
}

impl AppConfig {
    /// Open `path`, dispatching on its extension, and parse it into an
    /// [AppConfig].
    ///
    /// An error is returned if:
    /// 1. The file has no recognized extension.
    /// 2. The file cannot be opened or read.
    /// 3. The contents do not parse as valid config for that format.
    pub fn deserialize(path: PathBuf) -> Result<Self, ConfigError> {
        debug!("Attempting to parse {path:?} as an app config file");

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::UnknownFileType(path.clone().into_os_string()))?;

        let config = match FileType::from_str(ext)? {
            FileType::Toml => {
                let mut buf = String::new();
                File::open(&path)
                    .log_on_err()?
                    .read_to_string(&mut buf)
                    .log_on_err()?;
                toml::from_str(&buf).log_on_err()?
            }
        };

        debug!("Successfully parsed app config file");
        Ok(config)
    }

    /// Resolve into a full [OrchestratorConfig], filling any field the file
    /// left unset with the corresponding solver/orchestrator default.
    pub fn into_orchestrator_config(self) -> OrchestratorConfig {
        let defaults = OrchestratorConfig::default();

        let exact = ExactConfig {
            time_limit: self
                .exact
                .time_limit_secs
                .map(Duration::from_secs)
                .if_none_then(|| {
                    debug!("app config: no exact.time_limit_secs set, falling back to default");
                    defaults.exact.time_limit
                }),
        };

        let heuristic = HeuristicConfig {
            seed: self.heuristic.seed.unwrap_or(defaults.heuristic.seed),
            max_passes: self
                .heuristic
                .max_passes
                .unwrap_or(defaults.heuristic.max_passes),
            max_random_restarts: self
                .heuristic
                .max_random_restarts
                .unwrap_or(defaults.heuristic.max_random_restarts),
            random_restart_max_group_size: self
                .heuristic
                .random_restart_max_group_size
                .unwrap_or(defaults.heuristic.random_restart_max_group_size),
            local_inversion_window: defaults.heuristic.local_inversion_window,
        };

        let hybrid = HybridConfig {
            per_cluster_time_limit: self
                .hybrid
                .per_cluster_time_limit_secs
                .map(Duration::from_secs)
                .if_none_then(|| {
                    debug!(
                        "app config: no hybrid.per_cluster_time_limit_secs set, falling back to default"
                    );
                    defaults.hybrid.per_cluster_time_limit
                }),
            heuristic: heuristic.clone(),
        };

        OrchestratorConfig {
            cache_dir: self.cache_dir.unwrap_or(defaults.cache_dir),
            default_method: self
                .default_method
                .map(Method::from)
                .unwrap_or(defaults.default_method),
            exact,
            heuristic,
            hybrid,
        }
    }
}

enum FileType {
    Toml,
}

impl FromStr for FileType {
    type Err = ConfigError;

    fn from_str(ext: &str) -> Result<FileType, Self::Err> {
        match ext {
            "toml" => Ok(FileType::Toml),
            _ => Err(ConfigError::UnsupportedFileType { ext: ext.into() }),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unable to determine file type for path {0:?}")]
    UnknownFileType(OsString),
    #[error("the file type with extension {ext:?} is not supported")]
    UnsupportedFileType { ext: String },
    #[error("error reading the config file")]
    FileRead(#[from] std::io::Error),
    #[error("error deserializing the config file")]
    Deserialization(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_extension_is_rejected() {
        let err = AppConfig::deserialize(PathBuf::from("config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFileType { .. }));
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = AppConfig::deserialize(PathBuf::from("config")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFileType(_)));
    }

    #[test]
    fn builder_produces_orchestrator_config_with_overrides() {
        let app_config = AppConfigBuilder::default()
            .cache_dir(PathBuf::from("/tmp/cache"))
            .build()
            .unwrap();
        let orchestrator_config = app_config.into_orchestrator_config();
        assert_eq!(orchestrator_config.cache_dir, PathBuf::from("/tmp/cache"));
        assert_eq!(orchestrator_config.default_method, Method::Heuristic);
    }

    #[test]
    fn toml_round_trip_overrides_only_specified_fields() {
        let toml_str = r#"
            cache_dir = "./cache"

            [heuristic]
            seed = 42
        "#;
        let app_config: AppConfig = toml::from_str(toml_str).unwrap();
        let orchestrator_config = app_config.into_orchestrator_config();
        assert_eq!(orchestrator_config.cache_dir, PathBuf::from("./cache"));
        assert_eq!(orchestrator_config.heuristic.seed, 42);
        assert_eq!(
            orchestrator_config.heuristic.max_passes,
            HeuristicConfig::default().max_passes
        );
    }
}
