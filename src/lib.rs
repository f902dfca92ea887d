use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod catalog;
pub mod headless;
pub mod selector;
pub mod settings;
pub mod viewer;
pub mod watch;

pub use catalog::Catalog;
pub use selector::{Selection, Selector};
pub use settings::Settings;
pub use viewer::PictureTrayApp;

#[derive(Debug, thiserror::Error)]
pub enum PictureTrayError {
    #[error("Failed to create thread pool: {0}")]
    ThreadPoolCreation(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to start async runtime: {0}")]
    RuntimeCreation(std::io::Error),

    #[error("Failed to read settings from {}: {source}", .path.display())]
    SettingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file: {0}")]
    SettingsFormat(#[from] serde_yaml::Error),

    #[error("Failed to save settings: {0}")]
    SettingsWrite(std::io::Error),

    #[error("Failed to watch image directories: {0}")]
    Watch(#[from] notify::Error),

    #[error("Failed to load preview for {}: {source}", .path.display())]
    PreviewLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("No images found in the configured directories")]
    NoImages,
}

pub type Result<T> = std::result::Result<T, PictureTrayError>;

/// Recognized image extensions, matched case-sensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "gif", "jpg", "jpeg", "png", "pbm", "pgm", "ppm", "xbm", "xpm",
];

pub(crate) const APP_DIR_NAME: &str = "picture-tray";

/// Where the current picture is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderTarget {
    /// Desktop window with preview and preferences
    Window,
    /// Print selections to stdout
    Headless,
}

#[derive(Parser, Clone, Debug)]
#[command(name = "picture-tray")]
#[command(about = "Show a random picture from your image directories")]
pub struct Args {
    #[arg(short, long, help = "Image directory to scan (repeatable, overrides the settings file)")]
    pub directory: Vec<PathBuf>,

    #[arg(short, long, help = "Settings file [default: <config dir>/picture-tray/settings.yaml]")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Show the stock images instead of the source directories")]
    pub stock: bool,

    #[arg(short, long, value_parser = humantime::parse_duration, help = "Time between pictures when switching on a timer, e.g. 3s or 1m")]
    pub interval: Option<Duration>,

    #[arg(short, long, value_enum, default_value_t = RenderTarget::Window)]
    pub target: RenderTarget,

    #[arg(long, help = "Print one selection and exit (headless only)")]
    pub once: bool,

    #[arg(long, help = "Do not watch the directories for changes")]
    pub no_watch: bool,

    #[arg(long, help = "Enable debug output")]
    pub debug: bool,
}

impl Args {
    pub fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Settings::default_path)
    }

    /// `settings` with the command-line overrides applied on top.
    pub fn effective_settings(&self, settings: &Settings) -> Settings {
        let mut effective = settings.clone();
        if !self.directory.is_empty() {
            effective.source_directories = self.directory.clone();
        }
        if self.stock {
            effective.show_stock = true;
        }
        if let Some(interval) = self.interval {
            effective.interval = interval;
        }
        effective
    }
}

/// The part of the file name after its last `.`, if any.
pub fn extension_of(path: &Path) -> Option<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
}

pub fn is_image_file(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
