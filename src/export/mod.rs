//! Sheet export - renders every variant of a character into spritesheets
//!
//! A variant (one part of one group, e.g. `Torso/Leather`) is the unit of
//! export. For each variant every configured animation is captured direction
//! by direction and frame by frame, quantized, row-shifted and painted into a
//! sheet, either one sheet per animation or a single combined sheet. The
//! manifest written next to the sheets records the geometry the importer needs.
//!
//! # Output layout
//!
//! ```text
//! <out>/<group>/<variant>/manifest.json
//! <out>/<group>/<variant>/<animation>.png      (separate sheets)
//! <out>/<group>/<variant>/<variant>.png        (combined sheet)
//! ```
//!
//! With `flatten_folders` everything lands in `<out>/` instead, prefixed with
//! `<group>_<variant>_` (the combined sheet becomes `<group>_<variant>.png`).

mod assembler;
mod batch;

pub use assembler::{export_variant, ExportedVariant};
pub use batch::export_batch;

use std::path::{Path, PathBuf};

use crate::config::{resolve_path, AnimationConfig, SkinConfig};
use crate::direction::DirectionConfig;
use crate::error::SheetError;
use crate::frames::{self, FrameError};
use crate::manifest::{MANIFEST_FILENAME, MANIFEST_SUFFIX};

/// Settings shared by every variant of an export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub pixel_size: u32,
    pub max_frames_width: u32,
    pub combine_animations: bool,
    /// Row shift applied to each captured frame (positive = up)
    pub y_offset: i32,
    pub flatten_folders: bool,
    pub limit_colors: bool,
    /// Reference image for the palette; falls back to each variant's texture
    pub palette: Option<PathBuf>,
    pub out_dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            pixel_size: 512,
            max_frames_width: 0,
            combine_animations: false,
            y_offset: 11,
            flatten_folders: false,
            limit_colors: true,
            palette: None,
            out_dir: PathBuf::from("SpriteExports"),
        }
    }
}

/// One animation as exported for every variant.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSpec {
    pub name: String,
    pub fps: u32,
    pub frames_per_direction: u32,
    pub frames: Vec<u32>,
    pub every_nth: Option<u32>,
    /// Source clip length in seconds
    pub clip_length: f32,
    pub clip_frame_rate: f32,
    pub directions: Vec<DirectionConfig>,
}

impl AnimationSpec {
    /// Evenly sampled animation over the standard eight directions.
    pub fn new(name: impl Into<String>, frames_per_direction: u32, clip_length: f32) -> Self {
        Self {
            name: name.into(),
            fps: 30,
            frames_per_direction,
            frames: Vec::new(),
            every_nth: None,
            clip_length,
            clip_frame_rate: 30.0,
            directions: DirectionConfig::standard(),
        }
    }

    pub fn from_config(config: &AnimationConfig) -> Result<Self, SheetError> {
        let directions = config
            .directions
            .iter()
            .map(|d| d.resolve())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SheetError::InvalidInput(format!("animation '{}': {}", config.name, e)))?;

        Ok(Self {
            name: config.name.clone(),
            fps: config.fps,
            frames_per_direction: config.frames_per_direction,
            frames: config.frames.clone(),
            every_nth: config.every_nth,
            clip_length: config.clip_length,
            clip_frame_rate: config.clip_frame_rate,
            directions,
        })
    }

    /// Frames in the source clip.
    pub fn total_source_frames(&self) -> Result<u32, FrameError> {
        frames::source_frame_count(self.clip_length, self.clip_frame_rate)
    }

    /// Source frames to capture, range-checked against the clip.
    pub fn resolve_frames(&self) -> Result<(Vec<u32>, u32), FrameError> {
        let total = self.total_source_frames()?;
        let selected =
            frames::resolve_frames(&self.frames, self.every_nth, self.frames_per_direction, total)?;
        frames::validate_frames(&selected, total)?;
        Ok((selected, total))
    }

    /// Direction labels in row order.
    pub fn direction_labels(&self) -> Vec<String> {
        self.directions.iter().map(|d| d.label.clone()).collect()
    }
}

/// One export unit.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSpec {
    pub group: String,
    pub name: String,
    pub sort_order: i32,
    /// Primary surface texture, used as fallback palette source
    pub texture: Option<PathBuf>,
}

impl VariantSpec {
    pub fn new(group: impl Into<String>, name: impl Into<String>, sort_order: i32) -> Self {
        Self { group: group.into(), name: name.into(), sort_order, texture: None }
    }

    /// Identifier used in progress output.
    pub fn unit_id(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }

    /// Part name written to the manifest.
    pub fn part_name(&self) -> String {
        format!("{}_{}", self.group, self.name)
    }
}

/// Where a variant's files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    dir: PathBuf,
    /// `<group>_<variant>_` when flattened
    prefix: String,
    combined: String,
}

impl OutputPaths {
    pub fn new(out_dir: &Path, variant: &VariantSpec, flatten: bool) -> Self {
        if flatten {
            Self {
                dir: out_dir.to_path_buf(),
                prefix: format!("{}_{}_", variant.group, variant.name),
                combined: format!("{}_{}.png", variant.group, variant.name),
            }
        } else {
            Self {
                dir: out_dir.join(&variant.group).join(&variant.name),
                prefix: String::new(),
                combined: format!("{}.png", variant.name),
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        if self.prefix.is_empty() {
            self.dir.join(MANIFEST_FILENAME)
        } else {
            self.dir.join(format!("{}{}", self.prefix, MANIFEST_SUFFIX))
        }
    }

    /// Filename of a per-animation sheet.
    pub fn animation_sheet(&self, animation: &str) -> String {
        format!("{}{}.png", self.prefix, animation)
    }

    /// Filename of the combined sheet.
    pub fn combined_sheet(&self) -> &str {
        &self.combined
    }
}

/// Everything an export run needs, resolved from a project config.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub settings: ExportSettings,
    pub animations: Vec<AnimationSpec>,
    pub variants: Vec<VariantSpec>,
    /// Root of the pre-rendered frame tree
    pub frames_dir: PathBuf,
}

impl ExportJob {
    /// Resolve a validated config; relative paths are taken from `root`.
    pub fn from_config(config: &SkinConfig, root: &Path) -> Result<Self, SheetError> {
        let export = &config.export;
        let settings = ExportSettings {
            pixel_size: export.pixel_size,
            max_frames_width: export.max_frames_width,
            combine_animations: export.combine_animations,
            y_offset: export.y_offset,
            flatten_folders: export.flatten_folders,
            limit_colors: export.limit_colors,
            palette: export.palette.as_deref().map(|p| resolve_path(root, p)),
            out_dir: resolve_path(root, &config.project.out),
        };

        let animations =
            config.animations.iter().map(AnimationSpec::from_config).collect::<Result<_, _>>()?;

        let variants = config
            .groups
            .iter()
            .flat_map(|group| {
                group.variants.iter().map(move |variant| VariantSpec {
                    group: group.name.clone(),
                    name: variant.name().to_string(),
                    sort_order: group.sort_order,
                    texture: variant.texture().map(|t| resolve_path(root, t)),
                })
            })
            .collect();

        Ok(Self {
            settings,
            animations,
            variants,
            frames_dir: resolve_path(root, &config.project.frames),
        })
    }
}
