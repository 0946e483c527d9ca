//! Unit-level error taxonomy shared by export and import.
//!
//! Every failure that aborts a single export variant or import manifest is
//! reported as a [`SheetError`]. Module-specific errors convert into it so the
//! batch drivers can classify them without inspecting messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::capture::CaptureError;
use crate::frames::FrameError;
use crate::layout::{CellRect, LayoutError};
use crate::manifest::ManifestError;

/// Coarse failure class used in run summaries and progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Manifest could not be parsed or failed schema checks
    MalformedManifest,
    /// A referenced sheet or source file is absent
    MissingAsset,
    /// A computed rectangle does not fit the physical sheet
    InvalidGeometry,
    /// The renderer returned no frame or a frame of the wrong size
    RenderCaptureFailure,
    /// Caller-supplied parameters were rejected before any work was done
    InvalidInput,
    /// Filesystem or codec failure
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::MalformedManifest => "malformed_manifest",
            ErrorKind::MissingAsset => "missing_asset",
            ErrorKind::InvalidGeometry => "invalid_geometry",
            ErrorKind::RenderCaptureFailure => "render_capture_failure",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Io => "io",
        };
        write!(f, "{}", name)
    }
}

/// Error that aborts one export variant or one imported manifest.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SheetError {
    /// Parse or schema failure in a manifest
    #[error("malformed manifest: {0}")]
    MalformedManifest(#[from] ManifestError),
    /// Referenced sheet or source file is absent
    #[error("missing asset: {}", .path.display())]
    MissingAsset { path: PathBuf },
    /// Cell rectangle falls outside the physical sheet
    #[error(
        "cell '{cell}' at ({}, {}) {}x{} lies outside sheet '{sheet}' ({sheet_w}x{sheet_h})",
        .rect.x, .rect.y, .rect.width, .rect.height,
        sheet_w = .sheet_size.0, sheet_h = .sheet_size.1
    )]
    InvalidGeometry { sheet: String, cell: String, rect: CellRect, sheet_size: (u32, u32) },
    /// The renderer could not produce a usable frame
    #[error("render capture failed: {0}")]
    RenderCaptureFailure(#[from] CaptureError),
    /// Frame selection parameters were rejected
    #[error("invalid frame selection: {0}")]
    Frames(#[from] FrameError),
    /// Layout parameters were rejected
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
    /// Other caller input rejected before any work was done
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Image encode/decode error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl SheetError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetError::MalformedManifest(_) => ErrorKind::MalformedManifest,
            SheetError::MissingAsset { .. } => ErrorKind::MissingAsset,
            SheetError::InvalidGeometry { .. } => ErrorKind::InvalidGeometry,
            SheetError::RenderCaptureFailure(_) => ErrorKind::RenderCaptureFailure,
            SheetError::Frames(_) | SheetError::Layout(_) | SheetError::InvalidInput(_) => {
                ErrorKind::InvalidInput
            }
            SheetError::Io(_) | SheetError::Image(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
