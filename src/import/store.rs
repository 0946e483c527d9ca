//! Image store boundary used by the disassembler.

use image::{imageops, RgbaImage};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SheetError};
use crate::layout::CellRect;

/// Opaque reference to a sheet held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetHandle(usize);

/// A named cell rectangle (bottom-left origin).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedCell {
    pub name: String,
    pub rect: CellRect,
}

/// Where imported sheets live and how they are cut up.
pub trait ImageStore {
    /// Store sheet bytes under `dest` and return a handle to the decoded image.
    fn put_image(&mut self, dest: &Path, bytes: &[u8]) -> Result<SheetHandle>;

    /// Pixel size of a stored sheet.
    fn dimensions(&self, handle: SheetHandle) -> Option<(u32, u32)>;

    /// Record the cells to slice from a sheet; every cell is `pixel_size` square.
    fn configure_grid(
        &mut self,
        handle: SheetHandle,
        pixel_size: u32,
        cells: Vec<NamedCell>,
    ) -> Result<()>;

    /// Cut every configured cell out of a sheet, keyed by cell name.
    fn slice_named(&self, handle: SheetHandle) -> Result<HashMap<String, RgbaImage>>;

    /// Drop the decoded sheet once it is no longer needed.
    fn release(&mut self, _handle: SheetHandle) {}
}

#[derive(Debug)]
struct StoredSheet {
    path: Option<PathBuf>,
    image: Option<RgbaImage>,
    cells: Vec<NamedCell>,
}

/// Store that copies sheets under a root folder and slices them in memory.
#[derive(Debug, Default)]
pub struct DirectoryStore {
    root: Option<PathBuf>,
    sheets: Vec<StoredSheet>,
}

impl DirectoryStore {
    /// Copy every stored sheet to `root/<dest>`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()), sheets: Vec::new() }
    }

    /// Keep sheets in memory only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Path a sheet was copied to, if any.
    pub fn stored_path(&self, handle: SheetHandle) -> Option<&Path> {
        self.sheets.get(handle.0)?.path.as_deref()
    }

    fn sheet(&self, handle: SheetHandle) -> Result<&StoredSheet> {
        self.sheets
            .get(handle.0)
            .ok_or_else(|| SheetError::InvalidInput(format!("unknown sheet handle {}", handle.0)))
    }
}

impl ImageStore for DirectoryStore {
    fn put_image(&mut self, dest: &Path, bytes: &[u8]) -> Result<SheetHandle> {
        let image = image::load_from_memory(bytes)?.to_rgba8();

        let path = match &self.root {
            Some(root) => {
                let path = root.join(dest);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, bytes)?;
                Some(path)
            }
            None => None,
        };

        self.sheets.push(StoredSheet { path, image: Some(image), cells: Vec::new() });
        Ok(SheetHandle(self.sheets.len() - 1))
    }

    fn dimensions(&self, handle: SheetHandle) -> Option<(u32, u32)> {
        self.sheets.get(handle.0)?.image.as_ref().map(|img| img.dimensions())
    }

    fn configure_grid(
        &mut self,
        handle: SheetHandle,
        pixel_size: u32,
        cells: Vec<NamedCell>,
    ) -> Result<()> {
        let sheet = self
            .sheets
            .get_mut(handle.0)
            .ok_or_else(|| SheetError::InvalidInput(format!("unknown sheet handle {}", handle.0)))?;
        if let Some(bad) =
            cells.iter().find(|c| c.rect.width != pixel_size || c.rect.height != pixel_size)
        {
            return Err(SheetError::InvalidInput(format!(
                "cell '{}' is {}x{} in a {}px grid",
                bad.name, bad.rect.width, bad.rect.height, pixel_size
            )));
        }
        sheet.cells = cells;
        Ok(())
    }

    fn slice_named(&self, handle: SheetHandle) -> Result<HashMap<String, RgbaImage>> {
        let sheet = self.sheet(handle)?;
        let image = sheet
            .image
            .as_ref()
            .ok_or_else(|| SheetError::InvalidInput("sheet already released".to_string()))?;
        let (width, height) = image.dimensions();

        sheet
            .cells
            .par_iter()
            .map(|cell| {
                let top = match cell.rect.top(height) {
                    Some(top) if cell.rect.fits_within(width, height) => top,
                    _ => {
                        return Err(SheetError::InvalidGeometry {
                            sheet: sheet
                                .path
                                .as_ref()
                                .map(|p| p.display().to_string())
                                .unwrap_or_default(),
                            cell: cell.name.clone(),
                            rect: cell.rect,
                            sheet_size: (width, height),
                        })
                    }
                };
                let sub =
                    imageops::crop_imm(image, cell.rect.x, top, cell.rect.width, cell.rect.height)
                        .to_image();
                Ok((cell.name.clone(), sub))
            })
            .collect()
    }

    fn release(&mut self, handle: SheetHandle) {
        if let Some(sheet) = self.sheets.get_mut(handle.0) {
            sheet.image = None;
            sheet.cells.clear();
        }
    }
}
