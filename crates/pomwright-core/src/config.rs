use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::profile::ActivationContext;
use crate::properties::DEFAULT_MAX_PASSES;

/// Engine configuration loaded from `pomwright.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub properties: PropertiesConfig,

    #[serde(default)]
    pub profiles: ProfilesConfig,

    #[serde(default, rename = "user-properties")]
    pub user_properties: BTreeMap<String, String>,

    /// Path to a Maven `settings.xml`.
    #[serde(default)]
    pub settings: Option<String>,
}

/// Scheduler settings from `[run]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_max_cycles", rename = "max-cycles")]
    pub max_cycles: usize,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default = "default_jobs")]
    pub jobs: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_cycles: default_max_cycles(),
            parallel: default_parallel(),
            jobs: default_jobs(),
        }
    }
}

fn default_max_cycles() -> usize {
    3
}

fn default_parallel() -> bool {
    true
}

fn default_jobs() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

/// Interpolation settings from `[properties]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesConfig {
    #[serde(default = "default_max_passes", rename = "max-passes")]
    pub max_passes: usize,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
        }
    }
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

/// Explicit profile activation from `[profiles]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub active: Vec<String>,
}

impl EngineConfig {
    /// Load configuration from `path`, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> miette::Result<Self> {
        if path.is_file() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                pomwright_util::errors::PomwrightError::Config {
                    message: format!("Failed to read {}: {e}", path.display()),
                }
            })?;
            Self::parse_toml(&content)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            pomwright_util::errors::PomwrightError::Config {
                message: format!("Failed to parse pomwright.toml: {e}"),
            }
            .into()
        })
    }

    /// `pomwright.toml` in the given directory.
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join("pomwright.toml")
    }

    /// Profile activation derived from `[profiles]` and `[user-properties]`,
    /// with `extra_active` (e.g. from settings.xml) appended.
    pub fn activation_context(&self, extra_active: &[String]) -> ActivationContext {
        let mut active = self.profiles.active.clone();
        for id in extra_active {
            if !active.contains(id) {
                active.push(id.clone());
            }
        }
        ActivationContext::new(active, self.user_properties.clone())
    }
}
