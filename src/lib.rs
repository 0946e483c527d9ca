//! skinsheet - spritesheet export and import for layered 2D characters
//!
//! A character is drawn as a stack of parts (body, torso, hair, ...), each
//! exported from a 3D renderer as spritesheets plus a JSON manifest:
//! - [`export`] captures every (animation, direction, frame) of a variant and
//!   paints it into a grid, optionally quantized and row-shifted
//! - [`import`] reads manifests back, slices the same grid cells and rebuilds
//!   per-part frame collections and a layered character
//!
//! Both sides place cells through [`layout`], so a sheet written by one is
//! read back cell for cell by the other.

pub mod capture;
pub mod cli;
pub mod config;
pub mod direction;
pub mod discovery;
pub mod error;
pub mod export;
pub mod frames;
pub mod import;
pub mod layout;
pub mod manifest;
pub mod palette;
pub mod progress;
pub mod report;
pub mod shift;
