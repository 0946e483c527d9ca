//! Paints captured frames into sheets and writes the manifest for one variant.

use image::{imageops, Rgba, RgbaImage};
use std::fs;
use std::path::PathBuf;

use super::{AnimationSpec, ExportSettings, OutputPaths, VariantSpec};
use crate::capture::{CaptureRequest, CaptureSession, Orientation};
use crate::error::{Result, SheetError};
use crate::frames::frame_time;
use crate::layout::{cell_name, plan_sheet, AnimationBlock, BlockShape, SheetPlan};
use crate::manifest::{AnimationEntry, Manifest, ManifestError};
use crate::palette::{Palette, Quantizer};
use crate::progress::ProgressReporter;
use crate::shift::shift_rows;

/// Transparent color for unpainted cells
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Files produced for one variant.
#[derive(Debug, Clone)]
pub struct ExportedVariant {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    pub sheets: Vec<PathBuf>,
    pub frames_captured: usize,
}

impl ExportedVariant {
    /// Every file written, manifest last.
    pub fn outputs(&self) -> Vec<PathBuf> {
        let mut outputs = self.sheets.clone();
        outputs.push(self.manifest_path.clone());
        outputs
    }
}

/// An animation with its frame selection resolved.
struct Resolved<'a> {
    spec: &'a AnimationSpec,
    frames: Vec<u32>,
    total_source_frames: u32,
}

/// Export one variant: capture, paint and save its sheets, then its manifest.
///
/// Any error aborts this variant only; sheets already written are left in
/// place.
pub fn export_variant(
    session: &mut CaptureSession<'_>,
    variant: &VariantSpec,
    animations: &[AnimationSpec],
    settings: &ExportSettings,
    reporter: &dyn ProgressReporter,
) -> Result<ExportedVariant> {
    let unit = variant.unit_id();
    let captured_before = session.captured();
    if animations.is_empty() {
        return Err(SheetError::InvalidInput("no animations configured".to_string()));
    }
    if session.pixel_size() != settings.pixel_size {
        return Err(SheetError::InvalidInput(format!(
            "capture session is {}px but export is {}px",
            session.pixel_size(),
            settings.pixel_size
        )));
    }

    let resolved = animations
        .iter()
        .map(|spec| {
            let (frames, total_source_frames) = spec.resolve_frames()?;
            reporter.info(
                &unit,
                format!(
                    "{}: frames {:?} of {} ({} directions)",
                    spec.name,
                    frames,
                    total_source_frames,
                    spec.directions.len()
                ),
            );
            Ok(Resolved { spec, frames, total_source_frames })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut quantizer = Quantizer::new(load_palette(variant, settings)?);
    if !quantizer.palette().is_empty() {
        reporter.info(&unit, format!("palette of {} colours", quantizer.palette().len()));
    }

    let paths = OutputPaths::new(&settings.out_dir, variant, settings.flatten_folders);
    fs::create_dir_all(paths.dir())?;

    let groups: Vec<(String, &[Resolved<'_>])> = if settings.combine_animations {
        vec![(paths.combined_sheet().to_string(), &resolved[..])]
    } else {
        resolved
            .iter()
            .enumerate()
            .map(|(i, r)| (paths.animation_sheet(&r.spec.name), &resolved[i..=i]))
            .collect()
    };

    let mut manifest = Manifest::new(variant.part_name(), settings.pixel_size, variant.sort_order);
    manifest.group_name = Some(variant.group.clone());
    manifest.max_frames_width = settings.max_frames_width;

    let mut sheets = Vec::with_capacity(groups.len());
    for (file, members) in groups {
        let shapes: Vec<BlockShape> = members
            .iter()
            .map(|r| BlockShape::new(r.spec.directions.len() as u32, r.frames.len() as u32))
            .collect();
        let plan = plan_sheet(&shapes, settings.pixel_size, settings.max_frames_width)?;
        reporter.info(
            &unit,
            format!(
                "{}: {}x{} cells ({}x{} px)",
                file,
                plan.grid.columns,
                plan.grid.total_rows,
                plan.grid.width_px(),
                plan.grid.height_px()
            ),
        );

        let mut sheet =
            RgbaImage::from_pixel(plan.grid.width_px(), plan.grid.height_px(), TRANSPARENT);
        for (member, block) in members.iter().zip(&plan.blocks) {
            paint_animation(
                &mut sheet,
                &plan,
                block,
                member,
                &file,
                session,
                &mut quantizer,
                settings.y_offset,
                &variant.name,
            )?;
            manifest.animations.push(AnimationEntry {
                name: member.spec.name.clone(),
                directions: member.spec.direction_labels(),
                frames_per_direction: block.frames_per_direction,
                fps: member.spec.fps,
                sheet_file: file.clone(),
                row_start: block.row_start,
                rows_per_direction: block.rows_per_direction,
            });
        }

        if settings.combine_animations {
            manifest.sheet_width = plan.grid.columns;
            manifest.combined_sheet = Some(file.clone());
        }

        let path = paths.dir().join(&file);
        sheet.save(&path)?;
        sheets.push(path);
    }

    // The importer trusts this manifest, so never write one it would reject
    let manifest_path = paths.manifest_path();
    let issues = manifest.validate();
    if !issues.is_empty() {
        return Err(ManifestError::Invalid { path: manifest_path, issues }.into());
    }
    manifest.save(&manifest_path)?;

    Ok(ExportedVariant {
        manifest,
        manifest_path,
        sheets,
        frames_captured: session.captured() - captured_before,
    })
}

/// Palette from the configured reference image, else the variant's texture.
fn load_palette(variant: &VariantSpec, settings: &ExportSettings) -> Result<Palette> {
    if !settings.limit_colors {
        return Ok(Palette::default());
    }
    match settings.palette.as_ref().or(variant.texture.as_ref()) {
        Some(path) if !path.is_file() => Err(SheetError::MissingAsset { path: path.clone() }),
        Some(path) => Ok(Palette::load(path)?),
        None => Ok(Palette::default()),
    }
}

/// Capture and paint every cell of one animation, directions outer.
fn paint_animation(
    sheet: &mut RgbaImage,
    plan: &SheetPlan,
    block: &AnimationBlock,
    animation: &Resolved<'_>,
    file: &str,
    session: &mut CaptureSession<'_>,
    quantizer: &mut Quantizer,
    y_offset: i32,
    variant: &str,
) -> Result<()> {
    let spec = animation.spec;
    let sheet_height = sheet.height();

    for (d, direction) in spec.directions.iter().enumerate() {
        for (f, &source_frame) in animation.frames.iter().enumerate() {
            let request = CaptureRequest {
                variant,
                animation: &spec.name,
                direction: &direction.label,
                direction_index: d as u32,
                source_frame,
                time_seconds: frame_time(
                    source_frame,
                    animation.total_source_frames,
                    spec.clip_length,
                ),
                orientation: Orientation { yaw: direction.yaw, pitch: direction.pitch },
            };

            let mut frame = session.capture(&request)?;
            quantizer.quantize_in_place(&mut frame);
            let frame = shift_rows(frame, y_offset);

            let rect = plan.grid.cell_rect(block, d as u32, f as u32)?;
            let top = match rect.top(sheet_height) {
                Some(top) if rect.fits_within(sheet.width(), sheet_height) => top,
                _ => {
                    return Err(SheetError::InvalidGeometry {
                        sheet: file.to_string(),
                        cell: cell_name(&spec.name, d as u32, f as u32),
                        rect,
                        sheet_size: sheet.dimensions(),
                    })
                }
            };
            imageops::replace(sheet, &frame, rect.x as i64, top as i64);
        }
    }
    Ok(())
}
