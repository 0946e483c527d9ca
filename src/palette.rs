//! Palette quantization for captured frames
//!
//! Every pixel's RGB is replaced by the nearest palette entry (Euclidean
//! distance over RGB, first entry wins ties) while its alpha is kept exactly.
//! An empty palette leaves images untouched.

use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::Path;

/// An RGB palette colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2] }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Squared RGB distance in 8-bit units.
    ///
    /// Ordering is identical to the Euclidean distance over channels
    /// normalized to `[0, 1]`, and being integral it keeps ties exact.
    fn distance_sq(self, other: Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// An ordered, de-duplicated set of colours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Build a palette, dropping repeats but keeping first-seen order.
    pub fn new(colors: impl IntoIterator<Item = Color>) -> Self {
        let mut seen = std::collections::HashSet::new();
        Self { colors: colors.into_iter().filter(|c| seen.insert(*c)).collect() }
    }

    /// Every distinct RGB in an image, scanning rows top to bottom.
    pub fn from_image(image: &RgbaImage) -> Self {
        Self::new(image.pixels().map(|p| Color::from_rgba(*p)))
    }

    /// Load a reference image and take its distinct colours.
    pub fn load(path: &Path) -> Result<Self, image::ImageError> {
        Ok(Self::from_image(&image::open(path)?.to_rgba8()))
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Nearest palette entry, or `None` for an empty palette.
    pub fn nearest(&self, color: Color) -> Option<Color> {
        let mut best: Option<(Color, u32)> = None;
        for &candidate in &self.colors {
            let dist = color.distance_sq(candidate);
            match best {
                // Strictly smaller only, so the earliest entry keeps ties
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((candidate, dist)),
            }
            if dist == 0 {
                break;
            }
        }
        best.map(|(c, _)| c)
    }
}

/// Quantizer with a nearest-colour memo shared across frames.
///
/// Captured frames of one variant repeat the same handful of colours, so the
/// cache turns most lookups into a hash probe.
#[derive(Debug, Clone)]
pub struct Quantizer {
    palette: Palette,
    cache: HashMap<Color, Color>,
}

impl Quantizer {
    pub fn new(palette: Palette) -> Self {
        Self { palette, cache: HashMap::new() }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Number of memoized colours.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Quantize an image in place.
    pub fn quantize_in_place(&mut self, image: &mut RgbaImage) {
        if self.palette.is_empty() {
            return;
        }
        for pixel in image.pixels_mut() {
            let source = Color::from_rgba(*pixel);
            let target = match self.cache.get(&source) {
                Some(&c) => c,
                None => {
                    let c = self.palette.nearest(source).unwrap_or(source);
                    self.cache.insert(source, c);
                    c
                }
            };
            *pixel = Rgba([target.r, target.g, target.b, pixel[3]]);
        }
    }

    /// Quantize an owned image and return it.
    pub fn quantize(&mut self, mut image: RgbaImage) -> RgbaImage {
        self.quantize_in_place(&mut image);
        image
    }
}

/// Quantize one image against a palette without keeping a cache.
pub fn quantize(image: &RgbaImage, palette: &Palette) -> RgbaImage {
    let mut out = image.clone();
    if palette.is_empty() {
        return out;
    }
    for pixel in out.pixels_mut() {
        if let Some(c) = palette.nearest(Color::from_rgba(*pixel)) {
            *pixel = Rgba([c.r, c.g, c.b, pixel[3]]);
        }
    }
    out
}
