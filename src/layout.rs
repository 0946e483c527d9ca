//! Sheet layout calculator - the shared addressing of spritesheet cells
//!
//! A sheet is a regular grid of `pixel_size × pixel_size` cells. Each animation
//! occupies a block of cell-rows starting at `row_start`; inside the block every
//! direction owns `rows_per_direction` consecutive rows, and frames run left to
//! right, wrapping after `max_frames_width` columns when that is non-zero.
//!
//! Logical row 0 is the top of the image. Rectangles are expressed with a
//! bottom-left origin (`y = (total_rows - 1 - row) * pixel_size`), which is the
//! convention recorded by manifests; [`CellRect::top`] converts back to the
//! top-down coordinates used by [`image::RgbaImage`].
//!
//! The exporter paints and the importer slices through [`SheetGrid::cell_rect`]
//! only, so the two sides cannot drift apart.
//!
//! # Examples
//!
//! ```
//! use skinsheet::layout::{plan_sheet, BlockShape};
//!
//! // 8 directions of 6 frames, wrapped at 4 columns
//! let plan = plan_sheet(&[BlockShape::new(8, 6)], 32, 4).unwrap();
//! assert_eq!(plan.grid.columns, 4);
//! assert_eq!(plan.grid.total_rows, 16);
//!
//! let rect = plan.grid.cell_rect(&plan.blocks[0], 0, 5).unwrap();
//! assert_eq!((rect.x, rect.y), (32, 14 * 32));
//! ```

use serde::Serialize;
use thiserror::Error;

/// Error raised when layout parameters are inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LayoutError {
    /// Cell side length of zero
    #[error("pixel size must be positive")]
    ZeroPixelSize,
    /// Animation with no frames per direction
    #[error("an animation must have at least one frame per direction")]
    NoFrames,
    /// Animation with no directions
    #[error("an animation must have at least one direction")]
    NoDirections,
    /// Direction index past the block's direction count
    #[error("direction {direction} out of range (animation has {count})")]
    DirectionOutOfRange { direction: u32, count: u32 },
    /// Frame index past the block's frame count
    #[error("frame {frame} out of range (animation has {count} per direction)")]
    FrameOutOfRange { frame: u32, count: u32 },
    /// Computed cell lies outside the grid
    #[error("cell (col {col}, row {row}) outside {columns}x{rows} grid")]
    CellOutOfGrid { col: u32, row: u32, columns: u32, rows: u32 },
    /// Pixel dimensions overflow
    #[error("sheet of {columns}x{rows} cells at {pixel_size}px is too large")]
    TooLarge { columns: u32, rows: u32, pixel_size: u32 },
}

/// Number of cell columns one direction's frames span.
pub fn effective_columns(frames_per_direction: u32, max_frames_width: u32) -> u32 {
    if max_frames_width > 0 {
        frames_per_direction.min(max_frames_width)
    } else {
        frames_per_direction
    }
}

/// Number of cell rows one direction occupies.
pub fn rows_per_direction(frames_per_direction: u32, max_frames_width: u32) -> u32 {
    if max_frames_width > 0 {
        frames_per_direction.div_ceil(max_frames_width).max(1)
    } else {
        1
    }
}

/// Name under which a cell is sliced: `{animation}_{direction}_{frame}`.
pub fn cell_name(animation: &str, direction: u32, frame: u32) -> String {
    format!("{}_{}_{}", animation, direction, frame)
}

/// Grid coordinates of one cell (row 0 is the top row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellAddress {
    pub col: u32,
    pub row: u32,
}

/// Map a (direction, frame) pair to its cell.
pub fn cell_address(
    direction: u32,
    frame: u32,
    max_frames_width: u32,
    rows_per_direction: u32,
    row_start: u32,
) -> CellAddress {
    let (col, row_within_dir) = if max_frames_width > 0 {
        (frame % max_frames_width, frame / max_frames_width)
    } else {
        (frame, 0)
    };
    // Saturates so an inconsistent block lands outside any grid
    let row = row_start
        .saturating_add(direction.saturating_mul(rows_per_direction))
        .saturating_add(row_within_dir);
    CellAddress { col, row }
}

/// Pixel rectangle of a cell, origin at the bottom-left of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    /// Top edge in top-down image coordinates.
    ///
    /// Returns `None` when the rectangle does not fit a sheet of this height.
    pub fn top(&self, sheet_height: u32) -> Option<u32> {
        sheet_height.checked_sub(self.y)?.checked_sub(self.height)
    }

    /// Check that the rectangle lies entirely inside a `width × height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|right| right <= width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= height)
    }
}

/// Shape of one animation before it is placed in a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockShape {
    pub direction_count: u32,
    pub frames_per_direction: u32,
}

impl BlockShape {
    pub fn new(direction_count: u32, frames_per_direction: u32) -> Self {
        Self { direction_count, frames_per_direction }
    }
}

/// Placement of one animation inside a physical sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimationBlock {
    pub row_start: u32,
    pub direction_count: u32,
    pub frames_per_direction: u32,
    pub rows_per_direction: u32,
}

impl AnimationBlock {
    /// Rows this block spans, or `None` if the count overflows.
    pub fn row_count(&self) -> Option<u32> {
        self.direction_count.checked_mul(self.rows_per_direction)
    }

    /// First row after this block, or `None` if it lies past `u32::MAX`.
    pub fn row_end(&self) -> Option<u32> {
        self.row_start.checked_add(self.row_count()?)
    }

    /// Number of cells in the block that hold frames.
    pub fn cell_count(&self) -> u64 {
        u64::from(self.direction_count) * u64::from(self.frames_per_direction)
    }
}

/// Everything needed to turn a block-relative (direction, frame) into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SheetGrid {
    pub pixel_size: u32,
    pub max_frames_width: u32,
    /// Sheet width in cells
    pub columns: u32,
    /// Sheet height in cells, summed over every block in the sheet
    pub total_rows: u32,
}

impl SheetGrid {
    /// Create a grid, rejecting zero cell size and pixel overflow.
    pub fn new(
        pixel_size: u32,
        max_frames_width: u32,
        columns: u32,
        total_rows: u32,
    ) -> Result<Self, LayoutError> {
        if pixel_size == 0 {
            return Err(LayoutError::ZeroPixelSize);
        }
        let too_large = LayoutError::TooLarge { columns, rows: total_rows, pixel_size };
        columns.checked_mul(pixel_size).ok_or_else(|| too_large.clone())?;
        total_rows.checked_mul(pixel_size).ok_or(too_large)?;
        Ok(Self { pixel_size, max_frames_width, columns, total_rows })
    }

    /// Sheet width in pixels.
    pub fn width_px(&self) -> u32 {
        self.columns * self.pixel_size
    }

    /// Sheet height in pixels.
    pub fn height_px(&self) -> u32 {
        self.total_rows * self.pixel_size
    }

    /// Cell address of `(direction, frame)` within `block`.
    pub fn cell_address(
        &self,
        block: &AnimationBlock,
        direction: u32,
        frame: u32,
    ) -> Result<CellAddress, LayoutError> {
        if direction >= block.direction_count {
            return Err(LayoutError::DirectionOutOfRange {
                direction,
                count: block.direction_count,
            });
        }
        if frame >= block.frames_per_direction {
            return Err(LayoutError::FrameOutOfRange {
                frame,
                count: block.frames_per_direction,
            });
        }

        let addr = cell_address(
            direction,
            frame,
            self.max_frames_width,
            block.rows_per_direction,
            block.row_start,
        );
        if addr.col >= self.columns || addr.row >= self.total_rows {
            return Err(LayoutError::CellOutOfGrid {
                col: addr.col,
                row: addr.row,
                columns: self.columns,
                rows: self.total_rows,
            });
        }
        Ok(addr)
    }

    /// Pixel rectangle of an address that is known to lie in the grid.
    pub fn rect_at(&self, addr: CellAddress) -> CellRect {
        CellRect {
            x: addr.col * self.pixel_size,
            y: (self.total_rows - 1 - addr.row) * self.pixel_size,
            width: self.pixel_size,
            height: self.pixel_size,
        }
    }

    /// Pixel rectangle of `(direction, frame)` within `block`.
    pub fn cell_rect(
        &self,
        block: &AnimationBlock,
        direction: u32,
        frame: u32,
    ) -> Result<CellRect, LayoutError> {
        self.cell_address(block, direction, frame).map(|addr| self.rect_at(addr))
    }

    /// Every cell of a block in painting order: directions outer, frames inner.
    pub fn block_cells(
        &self,
        block: &AnimationBlock,
    ) -> Result<Vec<(u32, u32, CellRect)>, LayoutError> {
        let grid_cells = u64::from(self.columns) * u64::from(self.total_rows);
        let mut cells = Vec::with_capacity(block.cell_count().min(grid_cells) as usize);
        for d in 0..block.direction_count {
            for f in 0..block.frames_per_direction {
                cells.push((d, f, self.cell_rect(block, d, f)?));
            }
        }
        Ok(cells)
    }
}

/// Geometry of one physical sheet and the blocks stacked inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetPlan {
    pub grid: SheetGrid,
    /// Blocks in declaration order, rows accumulating top to bottom
    pub blocks: Vec<AnimationBlock>,
}

/// Stack animations into one sheet in declaration order.
///
/// A single shape gives a per-animation sheet. Several shapes give a combined
/// sheet whose width is the widest animation; narrower animations leave their
/// trailing cells transparent.
pub fn plan_sheet(
    shapes: &[BlockShape],
    pixel_size: u32,
    max_frames_width: u32,
) -> Result<SheetPlan, LayoutError> {
    let mut blocks = Vec::with_capacity(shapes.len());
    let mut columns = 0;
    let mut total_rows = 0u32;

    for shape in shapes {
        if shape.direction_count == 0 {
            return Err(LayoutError::NoDirections);
        }
        if shape.frames_per_direction == 0 {
            return Err(LayoutError::NoFrames);
        }

        let block = AnimationBlock {
            row_start: total_rows,
            direction_count: shape.direction_count,
            frames_per_direction: shape.frames_per_direction,
            rows_per_direction: rows_per_direction(shape.frames_per_direction, max_frames_width),
        };
        columns = columns.max(effective_columns(shape.frames_per_direction, max_frames_width));
        total_rows = block.row_end().ok_or(LayoutError::TooLarge {
            columns,
            rows: u32::MAX,
            pixel_size,
        })?;
        blocks.push(block);
    }

    let grid = SheetGrid::new(pixel_size, max_frames_width, columns, total_rows)?;
    Ok(SheetPlan { grid, blocks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_effective_columns() {
        assert_eq!(effective_columns(6, 0), 6);
        assert_eq!(effective_columns(6, 4), 4);
        assert_eq!(effective_columns(3, 4), 3);
        assert_eq!(effective_columns(1, 0), 1);
    }

    #[test]
    fn test_rows_per_direction() {
        assert_eq!(rows_per_direction(6, 0), 1);
        assert_eq!(rows_per_direction(6, 4), 2);
        assert_eq!(rows_per_direction(8, 4), 2);
        assert_eq!(rows_per_direction(9, 4), 3);
        // No wrapping when the threshold is at least the frame count
        assert_eq!(rows_per_direction(4, 4), 1);
        assert_eq!(rows_per_direction(3, 10), 1);
        assert_eq!(rows_per_direction(1, 1), 1);
    }

    #[test]
    fn test_cell_address_unwrapped() {
        assert_eq!(cell_address(0, 0, 0, 1, 0), CellAddress { col: 0, row: 0 });
        assert_eq!(cell_address(2, 5, 0, 1, 0), CellAddress { col: 5, row: 2 });
        assert_eq!(cell_address(1, 3, 0, 1, 10), CellAddress { col: 3, row: 11 });
    }

    #[test]
    fn test_cell_address_wrapped() {
        // 6 frames wrapped at 4: frames 4 and 5 spill onto the direction's second row
        assert_eq!(cell_address(0, 3, 4, 2, 0), CellAddress { col: 3, row: 0 });
        assert_eq!(cell_address(0, 4, 4, 2, 0), CellAddress { col: 0, row: 1 });
        assert_eq!(cell_address(1, 0, 4, 2, 0), CellAddress { col: 0, row: 2 });
        assert_eq!(cell_address(1, 5, 4, 2, 8), CellAddress { col: 1, row: 11 });
    }

    #[test]
    fn test_rect_is_bottom_up() {
        let plan = plan_sheet(&[BlockShape::new(2, 3)], 16, 0).unwrap();
        let block = &plan.blocks[0];

        // Row 0 lives at the top of the image, i.e. the highest bottom-origin y
        let r = plan.grid.cell_rect(block, 0, 0).unwrap();
        assert_eq!(r, CellRect { x: 0, y: 16, width: 16, height: 16 });
        assert_eq!(r.top(plan.grid.height_px()), Some(0));

        let r = plan.grid.cell_rect(block, 1, 2).unwrap();
        assert_eq!(r, CellRect { x: 32, y: 0, width: 16, height: 16 });
        assert_eq!(r.top(plan.grid.height_px()), Some(16));
    }

    #[test]
    fn test_plan_separate_sheet() {
        let plan = plan_sheet(&[BlockShape::new(8, 6)], 32, 0).unwrap();
        assert_eq!(plan.grid.columns, 6);
        assert_eq!(plan.grid.total_rows, 8);
        assert_eq!(plan.grid.width_px(), 192);
        assert_eq!(plan.grid.height_px(), 256);
        assert_eq!(plan.blocks[0].row_start, 0);
        assert_eq!(plan.blocks[0].rows_per_direction, 1);
    }

    #[test]
    fn test_plan_combined_accumulates_rows() {
        let shapes = [BlockShape::new(8, 6), BlockShape::new(4, 10), BlockShape::new(1, 1)];
        let plan = plan_sheet(&shapes, 32, 4).unwrap();

        assert_eq!(plan.blocks[0].row_start, 0);
        assert_eq!(plan.blocks[0].rows_per_direction, 2);
        assert_eq!(plan.blocks[1].row_start, 16);
        assert_eq!(plan.blocks[1].rows_per_direction, 3);
        assert_eq!(plan.blocks[2].row_start, 28);
        assert_eq!(plan.blocks[2].rows_per_direction, 1);

        assert_eq!(plan.grid.total_rows, 29);
        assert_eq!(plan.grid.columns, 4);

        // Row accounting: blocks tile [0, total_rows) without gaps
        let mut next = 0;
        for block in &plan.blocks {
            assert_eq!(block.row_start, next);
            next = block.row_end().unwrap();
        }
        assert_eq!(next, plan.grid.total_rows);
    }

    #[test]
    fn test_plan_combined_width_is_widest_animation() {
        let shapes = [BlockShape::new(1, 3), BlockShape::new(1, 7)];
        let plan = plan_sheet(&shapes, 8, 0).unwrap();
        assert_eq!(plan.grid.columns, 7);
        assert_eq!(plan.grid.width_px(), 56);
    }

    #[test]
    fn test_single_frame_animation() {
        let plan = plan_sheet(&[BlockShape::new(8, 1)], 64, 4).unwrap();
        assert_eq!(plan.grid.columns, 1);
        assert_eq!(plan.blocks[0].rows_per_direction, 1);
        assert_eq!(plan.grid.total_rows, 8);
    }

    #[test]
    fn test_addresses_are_injective() {
        let shapes = [BlockShape::new(8, 6), BlockShape::new(3, 9), BlockShape::new(5, 2)];
        for max in [0, 1, 2, 4, 5, 20] {
            let plan = plan_sheet(&shapes, 4, max).unwrap();
            let mut seen = HashSet::new();
            for block in &plan.blocks {
                for (_, _, rect) in plan.grid.block_cells(block).unwrap() {
                    assert!(seen.insert(rect), "duplicate rect {:?} with max={}", rect, max);
                    assert!(rect.fits_within(plan.grid.width_px(), plan.grid.height_px()));
                }
            }
            let expected: u64 = plan.blocks.iter().map(|b| b.cell_count()).sum();
            assert_eq!(seen.len() as u64, expected);
        }
    }

    #[test]
    fn test_out_of_range_indices() {
        let plan = plan_sheet(&[BlockShape::new(2, 3)], 8, 0).unwrap();
        let block = &plan.blocks[0];
        assert_eq!(
            plan.grid.cell_rect(block, 2, 0),
            Err(LayoutError::DirectionOutOfRange { direction: 2, count: 2 })
        );
        assert_eq!(
            plan.grid.cell_rect(block, 0, 3),
            Err(LayoutError::FrameOutOfRange { frame: 3, count: 3 })
        );
    }

    #[test]
    fn test_block_outside_grid() {
        let grid = SheetGrid::new(8, 0, 2, 2).unwrap();
        let block = AnimationBlock {
            row_start: 1,
            direction_count: 2,
            frames_per_direction: 2,
            rows_per_direction: 1,
        };
        assert!(matches!(grid.cell_rect(&block, 1, 0), Err(LayoutError::CellOutOfGrid { .. })));
    }

    #[test]
    fn test_degenerate_shapes_rejected() {
        assert_eq!(plan_sheet(&[BlockShape::new(0, 3)], 8, 0), Err(LayoutError::NoDirections));
        assert_eq!(plan_sheet(&[BlockShape::new(8, 0)], 8, 0), Err(LayoutError::NoFrames));
        assert_eq!(plan_sheet(&[BlockShape::new(8, 3)], 0, 0), Err(LayoutError::ZeroPixelSize));
    }

    #[test]
    fn test_row_count_overflow() {
        let block = AnimationBlock {
            row_start: 0,
            direction_count: 2,
            frames_per_direction: u32::MAX,
            rows_per_direction: u32::MAX,
        };
        assert_eq!(block.row_count(), None);
        assert_eq!(block.row_end(), None);
        assert_eq!(block.cell_count(), 2 * u64::from(u32::MAX));

        let late = AnimationBlock { row_start: u32::MAX, rows_per_direction: 1, ..block };
        assert_eq!(late.row_count(), Some(2));
        assert_eq!(late.row_end(), None);

        let grid = SheetGrid::new(1, 1, 1, 4).unwrap();
        assert!(matches!(grid.cell_rect(&block, 1, 0), Err(LayoutError::CellOutOfGrid { .. })));
    }

    #[test]
    fn test_fits_within() {
        let rect = CellRect { x: 16, y: 16, width: 16, height: 16 };
        assert!(rect.fits_within(32, 32));
        assert!(!rect.fits_within(31, 32));
        assert!(!rect.fits_within(32, 16));
        assert_eq!(rect.top(16), None);
    }

    #[test]
    fn test_cell_name() {
        assert_eq!(cell_name("walk", 3, 12), "walk_3_12");
    }
}
