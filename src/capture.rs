//! Renderer boundary for frame capture
//!
//! The exporter never talks to a renderer directly. It opens a
//! [`CaptureSession`] that exclusively borrows one [`FrameRenderer`] for the
//! whole run, so captures are strictly sequential and the renderer's camera
//! and scene state have a single owner. Every captured frame is checked to be
//! `pixel_size × pixel_size` before it reaches the sheet.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error from a renderer or from frame validation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    /// No frame available for the request
    #[error("frame not found: {}", .path.display())]
    MissingFrame { path: PathBuf },
    /// Frame exists but could not be decoded
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Frame has the wrong dimensions
    #[error("captured {request} is {}x{} but cells are {expected}x{expected}", .actual.0, .actual.1)]
    WrongSize { request: String, expected: u32, actual: (u32, u32) },
    /// Renderer-specific failure
    #[error("renderer failed on {request}: {message}")]
    Renderer { request: String, message: String },
}

/// Camera orientation for one direction, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Rotation about the vertical axis
    pub yaw: f32,
    /// Rotation about the horizontal axis
    pub pitch: f32,
}

/// Everything a renderer needs to produce one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest<'a> {
    pub variant: &'a str,
    pub animation: &'a str,
    /// Direction label as written to the manifest
    pub direction: &'a str,
    pub direction_index: u32,
    /// Index on the source clip's timeline
    pub source_frame: u32,
    /// Sample time in seconds
    pub time_seconds: f32,
    pub orientation: Orientation,
}

impl std::fmt::Display for CaptureRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{} frame {}",
            self.variant, self.animation, self.direction, self.source_frame
        )
    }
}

/// Source of captured frames.
///
/// `capture` blocks until the frame is fully rendered.
pub trait FrameRenderer {
    fn capture(&mut self, request: &CaptureRequest<'_>) -> Result<RgbaImage, CaptureError>;
}

/// Exclusive, size-checked access to a renderer for one export run.
pub struct CaptureSession<'r> {
    renderer: &'r mut dyn FrameRenderer,
    pixel_size: u32,
    captured: usize,
}

impl<'r> CaptureSession<'r> {
    pub fn open(renderer: &'r mut dyn FrameRenderer, pixel_size: u32) -> Self {
        Self { renderer, pixel_size, captured: 0 }
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Frames captured so far.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Capture one frame and check its size.
    pub fn capture(&mut self, request: &CaptureRequest<'_>) -> Result<RgbaImage, CaptureError> {
        let frame = self.renderer.capture(request)?;
        if frame.dimensions() != (self.pixel_size, self.pixel_size) {
            return Err(CaptureError::WrongSize {
                request: request.to_string(),
                expected: self.pixel_size,
                actual: frame.dimensions(),
            });
        }
        self.captured += 1;
        Ok(frame)
    }
}

/// Renderer backed by a tree of pre-rendered PNG frames.
///
/// Frames are read from
/// `<root>/<variant>/<animation>/<direction>/<source_frame:04>.png`.
#[derive(Debug, Clone)]
pub struct FrameDirectoryRenderer {
    root: PathBuf,
}

impl FrameDirectoryRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the frame file for a request.
    pub fn frame_path(&self, request: &CaptureRequest<'_>) -> PathBuf {
        self.root
            .join(request.variant)
            .join(request.animation)
            .join(request.direction)
            .join(format!("{:04}.png", request.source_frame))
    }
}

impl FrameRenderer for FrameDirectoryRenderer {
    fn capture(&mut self, request: &CaptureRequest<'_>) -> Result<RgbaImage, CaptureError> {
        let path = self.frame_path(request);
        if !path.is_file() {
            return Err(CaptureError::MissingFrame { path });
        }
        match image::open(&path) {
            Ok(img) => Ok(img.to_rgba8()),
            Err(source) => Err(CaptureError::Decode { path, source }),
        }
    }
}
