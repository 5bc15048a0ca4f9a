use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::SessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rounds: usize,
    pub random_length: usize,
    pub time_limit_secs: u64,
    pub tick_ms: u64,
    pub combos_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: 10,
            random_length: 6,
            time_limit_secs: 30,
            tick_ms: crate::TICK_RATE_MS,
            combos_file: PathBuf::from(crate::combos::BUNDLED_COMBOS),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            rounds: cfg.rounds,
            random_length: cfg.random_length.max(1),
            time_limit: Duration::from_secs(cfg.time_limit_secs),
            tick: Duration::from_millis(cfg.tick_ms.max(1)),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "kombo") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("kombo_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "ignoring invalid config"
                    )
                }
            },
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "no config file")
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
