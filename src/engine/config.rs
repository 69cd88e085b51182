//! Application settings: defaults, an optional JSON file, then CLI overrides.

use std::fmt;
use std::path::{ Path, PathBuf };
use clap::{ Parser, ValueEnum };
use serde::{ Deserialize, Serialize };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    Triangle,
    #[default]
    Lighting,
    Fractal,
    Models,
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DemoKind::Triangle => "triangle",
            DemoKind::Lighting => "lighting",
            DemoKind::Fractal => "fractal",
            DemoKind::Models => "models",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "gl-sandbox".to_string(),
            vsync: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub demo: DemoKind,
    /// Directory holding `shaders/` and `textures/`.
    pub asset_root: PathBuf,
    /// Model shown by the models demo.
    pub model: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            demo: DemoKind::default(),
            asset_root: PathBuf::from("assets"),
            model: PathBuf::from("assets/models/backpack/backpack.obj"),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn shader_path(&self, file: &str) -> PathBuf {
        self.asset_root.join("shaders").join(file)
    }

    pub fn texture_path(&self, file: &str) -> PathBuf {
        self.asset_root.join("textures").join(file)
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "gl-sandbox")]
#[command(about = "OpenGL exercises: triangle, lighting, fractal and model viewer")]
pub struct Cli {
    /// Demo to run
    #[arg(value_enum)]
    pub demo: Option<DemoKind>,

    /// JSON config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Asset directory
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Model file for the models demo
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,
}

impl Cli {
    /// Loads the config file (or defaults) and applies the flags on top.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(demo) = self.demo {
            config.demo = demo;
        }
        if let Some(assets) = &self.assets {
            config.asset_root = assets.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
    }
}
