//! Configuration loading and discovery for `skinsheet.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{ExportConfig, ImportConfig, ProjectConfig, SkinConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_FILENAME: &str = "skinsheet.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse skinsheet.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override export output directory
    pub out: Option<PathBuf>,
    /// Override pre-rendered frame root
    pub frames: Option<PathBuf>,
    pub pixel_size: Option<u32>,
    pub max_frames_width: Option<u32>,
    pub combine_animations: Option<bool>,
    pub y_offset: Option<i32>,
    pub flatten_folders: Option<bool>,
    pub limit_colors: Option<bool>,
    pub palette: Option<PathBuf>,
    /// Override import output directory
    pub import_out: Option<PathBuf>,
    pub compose_character: Option<bool>,
    pub write_frames: Option<bool>,
}

/// Find skinsheet.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find skinsheet.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a skinsheet.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns a default
/// configuration.
///
/// # Example
/// ```no_run
/// use skinsheet::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Some(Path::new("knight/skinsheet.toml"))).unwrap();
/// println!("{} groups", config.groups.len());
/// ```
pub fn load_config(path: Option<&Path>) -> Result<SkinConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

fn load_config_file(path: &Path) -> Result<SkinConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SkinConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Create a default configuration when no skinsheet.toml is found.
///
/// The project is named after the current directory and has no animations
/// or groups.
pub fn default_config() -> SkinConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    SkinConfig {
        project: ProjectConfig {
            name: project_name,
            frames: PathBuf::from("frames"),
            out: PathBuf::from("SpriteExports"),
        },
        export: ExportConfig::default(),
        import: ImportConfig::default(),
        animations: Vec::new(),
        groups: Vec::new(),
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut SkinConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }
    if let Some(ref frames) = overrides.frames {
        config.project.frames = frames.clone();
    }

    if let Some(pixel_size) = overrides.pixel_size {
        config.export.pixel_size = pixel_size;
    }
    if let Some(max) = overrides.max_frames_width {
        config.export.max_frames_width = max;
    }
    if let Some(combine) = overrides.combine_animations {
        config.export.combine_animations = combine;
    }
    if let Some(y_offset) = overrides.y_offset {
        config.export.y_offset = y_offset;
    }
    if let Some(flatten) = overrides.flatten_folders {
        config.export.flatten_folders = flatten;
    }
    if let Some(limit) = overrides.limit_colors {
        config.export.limit_colors = limit;
    }
    if let Some(ref palette) = overrides.palette {
        config.export.palette = Some(palette.clone());
    }

    if let Some(ref out) = overrides.import_out {
        config.import.out = out.clone();
    }
    if let Some(compose) = overrides.compose_character {
        config.import.compose_character = compose;
    }
    if let Some(write) = overrides.write_frames {
        config.import.write_frames = write;
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
