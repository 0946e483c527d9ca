//! Inspect command implementation

use serde_json::{json, Value};
use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::layout::{cell_name, CellRect};
use crate::manifest::{Manifest, SheetRef};

/// One sheet as listed by `inspect`.
struct SheetListing {
    file: String,
    columns: u32,
    rows: u32,
    width_px: u32,
    height_px: u32,
    /// Actual image size, if the file could be read
    found: Option<(u32, u32)>,
    cells: Vec<(String, CellRect)>,
}

fn list_sheet(manifest: &Manifest, sheet: &SheetRef, base: &Path) -> Result<SheetListing, String> {
    let mut cells = Vec::new();
    for &i in &sheet.entries {
        let entry = &manifest.animations[i];
        let block_cells = sheet.grid.block_cells(&entry.block()).map_err(|e| e.to_string())?;
        for (d, f, rect) in block_cells {
            cells.push((cell_name(&entry.name, d, f), rect));
        }
    }

    Ok(SheetListing {
        file: sheet.file.clone(),
        columns: sheet.grid.columns,
        rows: sheet.grid.total_rows,
        width_px: sheet.grid.width_px(),
        height_px: sheet.grid.height_px(),
        found: image::image_dimensions(base.join(&sheet.file)).ok(),
        cells,
    })
}

/// Execute the inspect command - print every cell rectangle of a manifest
pub fn run_inspect(path: &Path, json_output: bool) -> ExitCode {
    let manifest = match Manifest::load(path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let sheets = match manifest.sheets() {
        Ok(sheets) => sheets,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let listings = match sheets
        .iter()
        .map(|s| list_sheet(&manifest, s, base))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(listings) => listings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json_output {
        println!("{}", to_json(&manifest, &listings));
    } else {
        print_text(&manifest, &listings);
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn to_json(manifest: &Manifest, listings: &[SheetListing]) -> Value {
    let sheets: Vec<Value> = listings
        .iter()
        .map(|s| {
            let cells: Vec<Value> = s
                .cells
                .iter()
                .map(|(name, rect)| {
                    json!({
                        "name": name,
                        "x": rect.x,
                        "y": rect.y,
                        "width": rect.width,
                        "height": rect.height,
                    })
                })
                .collect();
            json!({
                "file": s.file,
                "columns": s.columns,
                "rows": s.rows,
                "widthPx": s.width_px,
                "heightPx": s.height_px,
                "found": s.found.map(|(w, h)| json!({ "width": w, "height": h })),
                "cells": cells,
            })
        })
        .collect();

    json!({
        "partName": manifest.part_name,
        "pixelSize": manifest.pixel_size,
        "sortOrder": manifest.sort_order,
        "sheets": sheets,
    })
}

fn print_text(manifest: &Manifest, listings: &[SheetListing]) {
    println!(
        "{} (sort order {}, {}px cells, {} animation(s))",
        manifest.part_name,
        manifest.sort_order,
        manifest.pixel_size,
        manifest.animations.len()
    );

    for sheet in listings {
        let found = match sheet.found {
            Some((w, h)) if (w, h) == (sheet.width_px, sheet.height_px) => "found".to_string(),
            Some((w, h)) => format!("found {}x{}", w, h),
            None => "missing".to_string(),
        };
        println!();
        println!(
            "{}: {}x{} cells, {}x{} px [{}]",
            sheet.file, sheet.columns, sheet.rows, sheet.width_px, sheet.height_px, found
        );
        for (name, rect) in &sheet.cells {
            println!("  {:<24} x={:<6} y={:<6} {}x{}", name, rect.x, rect.y, rect.width, rect.height);
        }
    }
}
