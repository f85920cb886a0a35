use crate::app_dirs::AppDirs;
use crate::selection::DEFAULT_SESSION_SIZE;
use crate::speech::DEFAULT_SPEECH_RATE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub session_size: usize,
    /// Word bank CSV; the bundled bank is used when unset
    pub word_bank: Option<PathBuf>,
    /// Where learner records are kept; the state directory when unset
    pub users_dir: Option<PathBuf>,
    pub speech: bool,
    /// Text-to-speech program; the platform default when unset
    pub speech_command: Option<String>,
    pub speech_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_size: DEFAULT_SESSION_SIZE,
            word_bank: None,
            users_dir: None,
            speech: true,
            speech_command: None,
            speech_rate: DEFAULT_SPEECH_RATE,
        }
    }
}

impl Config {
    pub fn users_dir(&self) -> PathBuf {
        self.users_dir.clone().unwrap_or_else(AppDirs::users_dir)
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
        Self {
            path: AppDirs::config_path(),
        }
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
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
