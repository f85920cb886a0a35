use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "beewise";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Base directory for state that should survive between runs
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// Directory holding one record file per learner
    pub fn users_dir() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("users"))
            .unwrap_or_else(|| PathBuf::from("users"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("beewise.log"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("beewise_config.json"))
    }
}
