use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PictureTrayError, Result, APP_DIR_NAME};

const SETTINGS_FILE_NAME: &str = "settings.yaml";
const STOCK_DIR_NAME: &str = "stock";
const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ignore the source directories and show the stock set.
    pub show_stock: bool,
    pub stock_directory: Option<PathBuf>,
    pub source_directories: Vec<PathBuf>,
    pub switch_on_open: bool,
    pub switch_every_interval: bool,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_stock: false,
            stock_directory: None,
            source_directories: Vec::new(),
            switch_on_open: false,
            switch_every_interval: false,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PictureTrayError::SettingsRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(PictureTrayError::SettingsWrite)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(PictureTrayError::SettingsWrite)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        let config_home = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"));
        config_home.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME)
    }

    pub fn stock_directory(&self) -> PathBuf {
        if let Some(dir) = &self.stock_directory {
            return dir.clone();
        }
        let data_home = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .unwrap_or_else(|| PathBuf::from(".local/share"));
        data_home.join(APP_DIR_NAME).join(STOCK_DIR_NAME)
    }

    pub fn switch_interval(&self) -> Duration {
        self.interval.max(MIN_INTERVAL)
    }

    /// The directories the catalog should scan.
    pub fn roots(&self) -> Vec<PathBuf> {
        if self.show_stock {
            vec![self.stock_directory()]
        } else {
            self.source_directories.clone()
        }
    }
}
