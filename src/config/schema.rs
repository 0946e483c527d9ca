//! Configuration schema types for `skinsheet.toml`
//!
//! Defines the structure and validation rules for an export/import project.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::direction::{Direction, DirectionConfig};
use crate::manifest::is_plain_name;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Root of the pre-rendered frame tree
    #[serde(default = "default_frames")]
    pub frames: PathBuf,
    /// Export output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_frames() -> PathBuf {
    PathBuf::from("frames")
}

fn default_out() -> PathBuf {
    PathBuf::from("SpriteExports")
}

/// Sheet export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Cell side length in pixels
    #[serde(default = "default_pixel_size")]
    pub pixel_size: u32,
    /// Row-wrap threshold in cells (0 = never wrap)
    #[serde(default)]
    pub max_frames_width: u32,
    /// Stack all animations of a variant into one sheet
    #[serde(default)]
    pub combine_animations: bool,
    /// Row shift applied to every captured frame (positive = up)
    #[serde(default = "default_y_offset")]
    pub y_offset: i32,
    /// Write every variant into the output root with prefixed names
    #[serde(default)]
    pub flatten_folders: bool,
    /// Quantize frames to a palette
    #[serde(default = "default_true")]
    pub limit_colors: bool,
    /// Reference image whose colours form the palette
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<PathBuf>,
}

fn default_pixel_size() -> u32 {
    512
}

fn default_y_offset() -> i32 {
    11
}

fn default_true() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_size: default_pixel_size(),
            max_frames_width: 0,
            combine_animations: false,
            y_offset: default_y_offset(),
            flatten_folders: false,
            limit_colors: true,
            palette: None,
        }
    }
}

/// Sheet import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Output directory for imported parts
    #[serde(default = "default_import_out")]
    pub out: PathBuf,
    /// Write `character.json` ordering all parts
    #[serde(default = "default_true")]
    pub compose_character: bool,
    /// Write every sliced frame as its own PNG
    #[serde(default = "default_true")]
    pub write_frames: bool,
}

fn default_import_out() -> PathBuf {
    PathBuf::from("Sprites/Character")
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { out: default_import_out(), compose_character: true, write_frames: true }
    }
}

/// A direction entry: a bare label or a label with an explicit camera angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectionSetting {
    Label(String),
    Custom {
        direction: String,
        /// Yaw in degrees; defaults to the standard yaw of `direction`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        angle: Option<f32>,
        /// Pitch in degrees
        #[serde(default)]
        x_angle: f32,
    },
}

impl DirectionSetting {
    pub fn label(&self) -> &str {
        match self {
            DirectionSetting::Label(label) => label,
            DirectionSetting::Custom { direction, .. } => direction,
        }
    }

    /// Resolve to a camera setup.
    pub fn resolve(&self) -> Result<DirectionConfig, String> {
        match self {
            DirectionSetting::Label(label) => label.parse::<Direction>().map(DirectionConfig::from),
            DirectionSetting::Custom { direction, angle, x_angle } => {
                let yaw = match angle {
                    Some(a) => *a,
                    None => direction.parse::<Direction>()?.yaw(),
                };
                Ok(DirectionConfig::new(direction.clone(), yaw, *x_angle))
            }
        }
    }
}

fn default_directions() -> Vec<DirectionSetting> {
    Direction::STANDARD_ORDER.iter().map(|d| DirectionSetting::Label(d.to_string())).collect()
}

/// One animation to export for every variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub name: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Evenly spaced sample count when no other policy is given
    #[serde(default = "default_frames_per_direction")]
    pub frames_per_direction: u32,
    /// Explicit source frame indices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<u32>,
    /// Take every Nth source frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_nth: Option<u32>,
    /// Source clip length in seconds
    pub clip_length: f32,
    /// Source clip sample rate
    #[serde(default = "default_clip_frame_rate")]
    pub clip_frame_rate: f32,
    #[serde(default = "default_directions")]
    pub directions: Vec<DirectionSetting>,
}

fn default_fps() -> u32 {
    30
}

fn default_frames_per_direction() -> u32 {
    8
}

fn default_clip_frame_rate() -> f32 {
    30.0
}

/// A variant entry: a bare name or a name with its surface texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantSetting {
    Name(String),
    Detailed {
        name: String,
        /// Fallback palette source
        #[serde(default, skip_serializing_if = "Option::is_none")]
        texture: Option<PathBuf>,
    },
}

impl VariantSetting {
    pub fn name(&self) -> &str {
        match self {
            VariantSetting::Name(name) | VariantSetting::Detailed { name, .. } => name,
        }
    }

    pub fn texture(&self) -> Option<&Path> {
        match self {
            VariantSetting::Name(_) => None,
            VariantSetting::Detailed { texture, .. } => texture.as_deref(),
        }
    }
}

/// A render layer and the variants exported for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub variants: Vec<VariantSetting>,
}

/// Complete `skinsheet.toml` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub animations: Vec<AnimationConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Validation error for a config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "animations[2].fps")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skinsheet.toml: '{}' {}", self.field, self.message)
    }
}

fn error(field: impl Into<String>, message: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError { field: field.into(), message: message.into() }
}

impl SkinConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.is_empty() {
            errors.push(error("project.name", "must be a non-empty string"));
        }
        if self.export.pixel_size == 0 {
            errors.push(error("export.pixel_size", "must be a positive integer"));
        }

        let mut names = HashSet::new();
        for (i, anim) in self.animations.iter().enumerate() {
            let field = |name: &str| format!("animations[{}].{}", i, name);

            if anim.name.is_empty() {
                errors.push(error(field("name"), "must be a non-empty string"));
            } else if !is_plain_name(&anim.name) {
                errors.push(error(field("name"), "must not contain path separators"));
            } else if !names.insert(anim.name.as_str()) {
                errors.push(error(field("name"), format!("duplicate animation '{}'", anim.name)));
            }
            if anim.fps == 0 {
                errors.push(error(field("fps"), "must be a positive integer"));
            }
            if anim.every_nth == Some(0) {
                errors.push(error(field("every_nth"), "must be at least 1"));
            }
            if anim.frames.is_empty() && anim.every_nth.is_none() && anim.frames_per_direction == 0
            {
                errors.push(error(field("frames_per_direction"), "must be a positive integer"));
            }
            if !anim.clip_length.is_finite() || anim.clip_length <= 0.0 {
                errors.push(error(field("clip_length"), "must be a positive number of seconds"));
            }
            if !anim.clip_frame_rate.is_finite() || anim.clip_frame_rate <= 0.0 {
                errors.push(error(field("clip_frame_rate"), "must be a positive number"));
            }

            if anim.directions.is_empty() {
                errors.push(error(field("directions"), "must list at least one direction"));
            }
            let mut labels = HashSet::new();
            for (d, setting) in anim.directions.iter().enumerate() {
                let field = format!("animations[{}].directions[{}]", i, d);
                if let Err(message) = setting.resolve() {
                    errors.push(error(field.clone(), message));
                }
                if !is_plain_name(setting.label()) {
                    errors.push(error(field.clone(), "label must not contain path separators"));
                }
                if !labels.insert(setting.label()) {
                    errors.push(error(field, format!("duplicate direction '{}'", setting.label())));
                }
            }
        }

        let mut groups = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.name.is_empty() {
                errors.push(error(format!("groups[{}].name", i), "must be a non-empty string"));
            } else if !is_plain_name(&group.name) {
                errors.push(error(
                    format!("groups[{}].name", i),
                    "must not contain path separators",
                ));
            } else if !groups.insert(group.name.as_str()) {
                errors.push(error(
                    format!("groups[{}].name", i),
                    format!("duplicate group '{}'", group.name),
                ));
            }

            let mut variants = HashSet::new();
            for (v, variant) in group.variants.iter().enumerate() {
                let field = format!("groups[{}].variants[{}]", i, v);
                if variant.name().is_empty() {
                    errors.push(error(field, "must be a non-empty name"));
                } else if !is_plain_name(variant.name()) {
                    errors.push(error(field, "must not contain path separators"));
                } else if !variants.insert(variant.name()) {
                    errors.push(error(field, format!("duplicate variant '{}'", variant.name())));
                }
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Total number of export units.
    pub fn variant_count(&self) -> usize {
        self.groups.iter().map(|g| g.variants.len()).sum()
    }
}
