//! Sheet import - rebuilds per-part frame collections from exported sheets
//!
//! Each manifest describes one character part. Its sheets are handed to an
//! [`ImageStore`], cut into cells at the rectangles the layout module
//! computes (the same ones the exporter painted), and regrouped by animation
//! and direction into a [`PartDefinition`]. A batch import walks a folder for
//! manifests and stacks the resulting parts into a [`LayeredCharacter`].
//!
//! A sheet file that is missing only drops the animations stored in it; a
//! manifest that cannot be parsed, or whose sheet is smaller than its layout,
//! fails that one part and the batch moves on.
//!
//! # Output layout
//!
//! ```text
//! <out>/Textures/<part>/<sheet>.png                  (copied sheets)
//! <out>/<part>/<animation>/<direction>/<frame>.png   (sliced frames)
//! <out>/<part>.part.json
//! <out>/character.json
//! ```

mod part;
mod store;

pub use part::{
    AnimationFrames, AnimationSummary, CharacterSummary, DirectionFrames, LayerSummary,
    LayeredCharacter, PartDefinition, PartSummary,
};
pub use store::{DirectoryStore, ImageStore, NamedCell, SheetHandle};

use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::discovery::{discover_manifests, DiscoveryError};
use crate::error::{Result, SheetError};
use crate::layout::{cell_name, CellRect};
use crate::manifest::Manifest;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::report::{RunSummary, UnitResult};

/// Filename of the layered character description.
pub const CHARACTER_FILENAME: &str = "character.json";

/// Folder under the store root that receives copied sheets.
pub const TEXTURES_DIR: &str = "Textures";

/// Geometry of one sliced sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicedSheet {
    pub file: String,
    pub columns: u32,
    pub rows: u32,
    pub cells: usize,
}

/// Result of importing one manifest.
#[derive(Debug, Clone)]
pub struct ImportedPart {
    pub part: PartDefinition,
    pub sheets: Vec<SlicedSheet>,
    /// Animations dropped because their sheet was missing
    pub skipped_animations: Vec<String>,
    pub warnings: Vec<String>,
}

/// Import one manifest and every sheet it references.
pub fn import_manifest(path: &Path, store: &mut dyn ImageStore) -> Result<ImportedPart> {
    let manifest = Manifest::load(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut sliced: HashMap<String, RgbaImage> = HashMap::new();
    let mut sheets = Vec::new();
    let mut skipped: HashSet<usize> = HashSet::new();
    let mut warnings = Vec::new();

    for sheet in manifest.sheets()? {
        let sheet_path = base.join(&sheet.file);
        let bytes = match fs::read(&sheet_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let names: Vec<_> =
                    sheet.entries.iter().map(|&i| manifest.animations[i].name.as_str()).collect();
                warnings.push(format!(
                    "missing sheet {}, skipping {}",
                    sheet_path.display(),
                    names.join(", ")
                ));
                skipped.extend(sheet.entries.iter().copied());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let dest = Path::new(TEXTURES_DIR).join(&manifest.part_name).join(&sheet.file);
        let handle = store.put_image(&dest, &bytes)?;
        let cells = slice_sheet(store, handle, &manifest, &sheet, &sheet_path);
        store.release(handle);
        let cells = cells?;

        sheets.push(SlicedSheet {
            file: sheet.file.clone(),
            columns: sheet.grid.columns,
            rows: sheet.grid.total_rows,
            cells: cells.len(),
        });
        sliced.extend(cells);
    }

    let mut animations = Vec::new();
    for (i, entry) in manifest.animations.iter().enumerate() {
        if skipped.contains(&i) {
            continue;
        }
        let directions = entry
            .directions
            .iter()
            .enumerate()
            .map(|(d, label)| {
                let frames = (0..entry.frames_per_direction)
                    .map(|f| {
                        let name = cell_name(&entry.name, d as u32, f);
                        sliced.remove(&name).ok_or_else(|| {
                            SheetError::InvalidInput(format!("store returned no cell '{}'", name))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(DirectionFrames { direction: label.clone(), frames })
            })
            .collect::<Result<Vec<_>>>()?;

        animations.push(AnimationFrames { name: entry.name.clone(), fps: entry.fps, directions });
    }

    let mut skipped_animations: Vec<_> = skipped.into_iter().collect();
    skipped_animations.sort_unstable();

    Ok(ImportedPart {
        part: PartDefinition {
            part_name: manifest.part_name,
            group_name: manifest.group_name,
            sort_order: manifest.sort_order,
            pixel_size: manifest.pixel_size,
            animations,
        },
        sheets,
        skipped_animations: skipped_animations
            .into_iter()
            .map(|i| manifest.animations[i].name.clone())
            .collect(),
        warnings,
    })
}

fn slice_sheet(
    store: &mut dyn ImageStore,
    handle: SheetHandle,
    manifest: &Manifest,
    sheet: &crate::manifest::SheetRef,
    sheet_path: &Path,
) -> Result<HashMap<String, RgbaImage>> {
    let (width, height) = store.dimensions(handle).ok_or_else(|| {
        SheetError::InvalidInput(format!("store lost sheet {}", sheet_path.display()))
    })?;

    let (grid_width, grid_height) = (sheet.grid.width_px(), sheet.grid.height_px());
    if grid_width > width || grid_height > height {
        return Err(SheetError::InvalidGeometry {
            sheet: sheet_path.display().to_string(),
            cell: format!("{}x{} grid", sheet.grid.columns, sheet.grid.total_rows),
            rect: CellRect { x: 0, y: 0, width: grid_width, height: grid_height },
            sheet_size: (width, height),
        });
    }

    let mut cells = Vec::new();
    for &i in &sheet.entries {
        let entry = &manifest.animations[i];
        for (d, f, rect) in sheet.grid.block_cells(&entry.block())? {
            let name = cell_name(&entry.name, d, f);
            if !rect.fits_within(width, height) {
                return Err(SheetError::InvalidGeometry {
                    sheet: sheet_path.display().to_string(),
                    cell: name,
                    rect,
                    sheet_size: (width, height),
                });
            }
            cells.push(NamedCell { name, rect });
        }
    }

    store.configure_grid(handle, manifest.pixel_size, cells)?;
    store.slice_named(handle)
}

/// Outcome of a folder import.
#[derive(Debug, Default)]
pub struct ImportRun {
    pub summary: RunSummary,
    /// Imported parts in discovery order
    pub parts: Vec<PartDefinition>,
}

/// Import every manifest below `root`, isolating failures per manifest.
///
/// Units are named by manifest path relative to `root`. A manifest whose
/// sheets are all missing is reported as skipped.
pub fn import_folder(
    root: &Path,
    store: &mut dyn ImageStore,
    reporter: &dyn ProgressReporter,
) -> std::result::Result<ImportRun, DiscoveryError> {
    let start = Instant::now();
    let (manifests, unreadable) = discover_manifests(root)?;

    for err in unreadable {
        reporter.report(ProgressEvent::Warning {
            unit: None,
            message: format!("cannot read {}: {}", err.path().display(), err.error()),
        });
    }

    reporter.report(ProgressEvent::RunStarted {
        operation: "import".to_string(),
        total_units: manifests.len(),
    });

    let mut run = ImportRun::default();
    for path in manifests {
        let unit = path.strip_prefix(root).unwrap_or(&path).display().to_string();
        reporter.report(ProgressEvent::UnitStarted { unit: unit.clone() });
        let unit_start = Instant::now();

        let result = match import_manifest(&path, store) {
            Ok(imported) => {
                for warning in &imported.warnings {
                    reporter.warn(&unit, warning.clone());
                }
                for sheet in &imported.sheets {
                    reporter.info(
                        &unit,
                        format!(
                            "{}: {} cells from a {}x{} grid",
                            sheet.file, sheet.cells, sheet.columns, sheet.rows
                        ),
                    );
                }

                if imported.part.animations.is_empty() && !imported.skipped_animations.is_empty()
                {
                    UnitResult::skipped(&unit, "no sheet could be read")
                        .with_warnings(imported.warnings)
                } else {
                    run.parts.push(imported.part);
                    UnitResult::success(&unit, vec![], unit_start.elapsed())
                        .with_warnings(imported.warnings)
                }
            }
            Err(err) => UnitResult::failed(&unit, &err, unit_start.elapsed()),
        };

        reporter.report(result.completed_event());
        run.summary.add_result(result);
    }

    run.summary = std::mem::take(&mut run.summary).with_duration(start.elapsed());
    reporter.report(run.summary.completed_event());
    Ok(run)
}

/// Write a part's frames and its `<part>.part.json` summary under `out_dir`.
///
/// Frames go to `<out>/<part>/<animation>/<direction>/<frame:03>.png`.
pub fn write_part(out_dir: &Path, part: &PartDefinition, write_frames: bool) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if write_frames {
        for animation in &part.animations {
            for direction in &animation.directions {
                let dir =
                    out_dir.join(&part.part_name).join(&animation.name).join(&direction.direction);
                fs::create_dir_all(&dir)?;
                for (f, frame) in direction.frames.iter().enumerate() {
                    let path = dir.join(format!("{:03}.png", f));
                    frame.save(&path)?;
                    written.push(path);
                }
            }
        }
    }

    let path = out_dir.join(format!("{}.part.json", part.part_name));
    write_json(&path, &part.summary())?;
    written.push(path);
    Ok(written)
}

/// Write `character.json` listing the layers back to front.
pub fn write_character(out_dir: &Path, character: &LayeredCharacter) -> Result<PathBuf> {
    let path = out_dir.join(CHARACTER_FILENAME);
    write_json(&path, &character.summary())?;
    Ok(path)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    fs::write(path, json)?;
    Ok(())
}
