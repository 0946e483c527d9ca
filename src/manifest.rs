//! Export manifest - the record that lets an importer invert the sheet layout
//!
//! One manifest is written per exported part, next to the sheet image(s) it
//! references. It stores enough geometry (`maxFramesWidth`, `rowStart`,
//! `rowsPerDirection`) for the importer to recompute every cell rectangle with
//! [`crate::layout`] without access to the scene that produced it.
//!
//! # Manifest Format
//!
//! ```json
//! {
//!   "groupName": "Torso",
//!   "exportPrefix": "Torso_Leather",
//!   "pixelSize": 64,
//!   "sortOrder": 3,
//!   "sheetWidth": 6,
//!   "maxFramesWidth": 0,
//!   "combinedSpritesheet": "Torso_Leather.png",
//!   "animations": [
//!     {
//!       "name": "walk",
//!       "directions": ["N", "NE", "E", "SE", "S", "SW", "W", "NW"],
//!       "framesPerDirection": 6,
//!       "fps": 12,
//!       "spritesheet": "Torso_Leather.png",
//!       "rowStart": 0,
//!       "rowsPerDirection": 1
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::layout::{self, AnimationBlock, LayoutError, SheetGrid};

/// Default manifest filename inside a per-variant folder.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Suffix shared by every manifest filename, including flattened exports.
pub const MANIFEST_SUFFIX: &str = "manifest.json";

/// Error while reading or checking a manifest.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManifestError {
    /// IO error
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON parse or schema error (missing field, wrong type)
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Parsed but inconsistent
    #[error("invalid manifest {}:\n{}", .path.display(), .issues.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Invalid { path: PathBuf, issues: Vec<ManifestIssue> },
}

/// A single consistency problem, addressed by field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIssue {
    pub field: String,
    pub message: String,
}

impl ManifestIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl std::fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Metadata for one exported character part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Export group (Body, Torso, ...); informational
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "empty_as_none")]
    pub group_name: Option<String>,
    /// Stable part identifier, also the merge key on import
    #[serde(rename = "exportPrefix")]
    pub part_name: String,
    /// Side length of every cell
    pub pixel_size: u32,
    /// Render layer; lower is drawn first
    pub sort_order: i32,
    /// Combined sheet width in cells (0 for per-animation sheets)
    pub sheet_width: u32,
    /// Row-wrap threshold in cells (0 = unlimited)
    pub max_frames_width: u32,
    /// Shared sheet filename when all animations live in one image
    #[serde(
        rename = "combinedSpritesheet",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub combined_sheet: Option<String>,
    /// Animations in export order
    pub animations: Vec<AnimationEntry>,
}

/// One animation's slice of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationEntry {
    pub name: String,
    /// Direction labels; the index is the direction's row group
    pub directions: Vec<String>,
    pub frames_per_direction: u32,
    pub fps: u32,
    /// Sheet holding this animation's frames
    #[serde(rename = "spritesheet")]
    pub sheet_file: String,
    /// Cell-row where this animation's block begins
    pub row_start: u32,
    pub rows_per_direction: u32,
}

impl AnimationEntry {
    /// Number of directions.
    pub fn direction_count(&self) -> u32 {
        self.directions.len() as u32
    }

    /// Cell-rows this animation occupies, or `None` if the count overflows.
    pub fn row_count(&self) -> Option<u32> {
        self.block().row_count()
    }

    /// Placement of this animation as a layout block.
    pub fn block(&self) -> AnimationBlock {
        AnimationBlock {
            row_start: self.row_start,
            direction_count: self.direction_count(),
            frames_per_direction: self.frames_per_direction,
            rows_per_direction: self.rows_per_direction,
        }
    }
}

/// One physical sheet referenced by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    /// Filename relative to the manifest
    pub file: String,
    /// Indices into `Manifest::animations`, in declaration order
    pub entries: Vec<usize>,
    /// Grid shared by every entry in this sheet
    pub grid: SheetGrid,
}

/// Whether `name` is a single plain path component that stays inside the
/// folder it is joined onto.
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    !name.contains(['/', '\\', ':', '\0'])
        && matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

impl Manifest {
    /// Create an empty manifest for a part.
    pub fn new(part_name: impl Into<String>, pixel_size: u32, sort_order: i32) -> Self {
        Self {
            group_name: None,
            part_name: part_name.into(),
            pixel_size,
            sort_order,
            sheet_width: 0,
            max_frames_width: 0,
            combined_sheet: None,
            animations: Vec::new(),
        }
    }

    /// Whether every animation shares one physical sheet.
    pub fn is_combined(&self) -> bool {
        self.combined_sheet.is_some()
    }

    /// Look up an animation entry by name.
    pub fn animation(&self, name: &str) -> Option<&AnimationEntry> {
        self.animations.iter().find(|a| a.name == name)
    }

    /// Parse a manifest from JSON text and validate it.
    pub fn from_json(json: &str, path: &Path) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(json)
            .map_err(|source| ManifestError::Parse { path: path.to_path_buf(), source })?;

        let issues = manifest.validate();
        if !issues.is_empty() {
            return Err(ManifestError::Invalid { path: path.to_path_buf(), issues });
        }
        Ok(manifest)
    }

    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let json = fs::read_to_string(path)
            .map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json, path)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the manifest, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    /// Group entries by physical sheet and compute each sheet's grid.
    ///
    /// `totalRows` of a sheet is the sum of `directions × rowsPerDirection`
    /// over the entries that reference it. Sheets are returned in order of
    /// first reference.
    pub fn sheets(&self) -> Result<Vec<SheetRef>, LayoutError> {
        let mut order: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, entry) in self.animations.iter().enumerate() {
            match order.iter_mut().find(|(file, _)| *file == entry.sheet_file) {
                Some((_, entries)) => entries.push(i),
                None => order.push((entry.sheet_file.clone(), vec![i])),
            }
        }

        order
            .into_iter()
            .map(|(file, entries)| {
                let too_large = LayoutError::TooLarge {
                    columns: self.sheet_width,
                    rows: u32::MAX,
                    pixel_size: self.pixel_size,
                };
                let total_rows = entries
                    .iter()
                    .try_fold(0u32, |total, &i| {
                        total.checked_add(self.animations[i].row_count()?)
                    })
                    .ok_or(too_large)?;
                let widest = entries
                    .iter()
                    .map(|&i| {
                        layout::effective_columns(
                            self.animations[i].frames_per_direction,
                            self.max_frames_width,
                        )
                    })
                    .max()
                    .unwrap_or(0);
                let columns = if self.combined_sheet.as_deref() == Some(file.as_str()) {
                    widest.max(self.sheet_width)
                } else {
                    widest
                };
                let grid =
                    SheetGrid::new(self.pixel_size, self.max_frames_width, columns, total_rows)?;
                Ok(SheetRef { file, entries, grid })
            })
            .collect()
    }

    /// Check the invariants that make the layout recoverable.
    ///
    /// Returns every problem found; an empty list means the manifest is valid.
    pub fn validate(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();

        if self.part_name.trim().is_empty() {
            issues.push(ManifestIssue::new("exportPrefix", "must not be empty"));
        } else if !is_plain_name(&self.part_name) {
            issues.push(ManifestIssue::new("exportPrefix", "must be a plain file name"));
        }
        if let Some(combined) = &self.combined_sheet {
            if !is_plain_name(combined) {
                issues.push(ManifestIssue::new("combinedSpritesheet", "must be a plain file name"));
            }
        }
        if self.pixel_size == 0 {
            issues.push(ManifestIssue::new("pixelSize", "must be a positive integer"));
        }

        let mut names = HashSet::new();
        for (i, entry) in self.animations.iter().enumerate() {
            let field = |name: &str| format!("animations[{}].{}", i, name);

            if entry.name.is_empty() {
                issues.push(ManifestIssue::new(field("name"), "must not be empty"));
            } else if !is_plain_name(&entry.name) {
                issues.push(ManifestIssue::new(field("name"), "must be a plain file name"));
            } else if !names.insert(entry.name.as_str()) {
                issues.push(ManifestIssue::new(
                    field("name"),
                    format!("duplicate animation '{}'", entry.name),
                ));
            }
            if entry.directions.is_empty() {
                issues.push(ManifestIssue::new(field("directions"), "must not be empty"));
            }
            for (d, label) in entry.directions.iter().enumerate() {
                if !is_plain_name(label) {
                    issues.push(ManifestIssue::new(
                        format!("animations[{}].directions[{}]", i, d),
                        format!("'{}' must be a plain file name", label),
                    ));
                }
            }
            if entry.frames_per_direction == 0 {
                issues.push(ManifestIssue::new(
                    field("framesPerDirection"),
                    "must be a positive integer",
                ));
            }
            if entry.fps == 0 {
                issues.push(ManifestIssue::new(field("fps"), "must be a positive integer"));
            }
            if entry.sheet_file.is_empty() {
                issues.push(ManifestIssue::new(field("spritesheet"), "must not be empty"));
            } else if !is_plain_name(&entry.sheet_file) {
                issues.push(ManifestIssue::new(field("spritesheet"), "must be a plain file name"));
            }

            let expected =
                layout::rows_per_direction(entry.frames_per_direction, self.max_frames_width);
            if entry.frames_per_direction > 0 && entry.rows_per_direction != expected {
                issues.push(ManifestIssue::new(
                    field("rowsPerDirection"),
                    format!(
                        "is {} but {} frames wrapped at {} need {}",
                        entry.rows_per_direction,
                        entry.frames_per_direction,
                        self.max_frames_width,
                        expected
                    ),
                ));
            }

            if let Some(combined) = &self.combined_sheet {
                if entry.sheet_file != *combined {
                    issues.push(ManifestIssue::new(
                        field("spritesheet"),
                        format!("must reference the combined sheet '{}'", combined),
                    ));
                }
            }
        }

        if let Some(combined) = &self.combined_sheet {
            let widest = self
                .animations
                .iter()
                .map(|a| layout::effective_columns(a.frames_per_direction, self.max_frames_width))
                .max()
                .unwrap_or(0);
            if self.sheet_width < widest {
                issues.push(ManifestIssue::new(
                    "sheetWidth",
                    format!(
                        "is {} but '{}' needs at least {} columns",
                        self.sheet_width, combined, widest
                    ),
                ));
            }
        }

        // Entries that share a sheet must tile its rows in declaration order
        let mut next_row: Vec<(&str, u32)> = Vec::new();
        for (i, entry) in self.animations.iter().enumerate() {
            let slot = match next_row.iter().position(|(file, _)| *file == entry.sheet_file) {
                Some(slot) => slot,
                None => {
                    next_row.push((entry.sheet_file.as_str(), 0));
                    next_row.len() - 1
                }
            };
            let expected = next_row[slot].1;
            if entry.row_start != expected {
                issues.push(ManifestIssue::new(
                    format!("animations[{}].rowStart", i),
                    format!(
                        "is {} but the previous block in '{}' ends at row {}",
                        entry.row_start, entry.sheet_file, expected
                    ),
                ));
            }
            match entry.block().row_end() {
                Some(end) => next_row[slot].1 = end,
                None => {
                    issues.push(ManifestIssue::new(
                        format!("animations[{}].rowsPerDirection", i),
                        "sheet too large",
                    ));
                    next_row[slot].1 = u32::MAX;
                }
            }
        }

        if issues.is_empty() {
            if let Err(err) = self.sheets() {
                issues.push(ManifestIssue::new("pixelSize", err.to_string()));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, dirs: usize, frames: u32, sheet: &str, row_start: u32) -> AnimationEntry {
        AnimationEntry {
            name: name.to_string(),
            directions: (0..dirs).map(|d| format!("D{}", d)).collect(),
            frames_per_direction: frames,
            fps: 12,
            sheet_file: sheet.to_string(),
            row_start,
            rows_per_direction: 1,
        }
    }

    fn combined_manifest() -> Manifest {
        let mut m = Manifest::new("Torso_Leather", 32, 3);
        m.sheet_width = 6;
        m.combined_sheet = Some("Torso_Leather.png".to_string());
        m.animations.push(entry("idle", 8, 4, "Torso_Leather.png", 0));
        m.animations.push(entry("walk", 8, 6, "Torso_Leather.png", 8));
        m
    }

    #[test]
    fn test_parse_required_fields() {
        let json = r#"{
            "exportPrefix": "Hair_02",
            "pixelSize": 64,
            "sortOrder": 7,
            "sheetWidth": 0,
            "maxFramesWidth": 4,
            "combinedSpritesheet": "",
            "animations": [{
                "name": "walk",
                "directions": ["N", "E", "S", "W"],
                "framesPerDirection": 6,
                "fps": 12,
                "spritesheet": "walk.png",
                "rowStart": 0,
                "rowsPerDirection": 2
            }]
        }"#;
        let m = Manifest::from_json(json, Path::new("manifest.json")).unwrap();
        assert_eq!(m.part_name, "Hair_02");
        assert_eq!(m.sort_order, 7);
        assert_eq!(m.combined_sheet, None);
        assert!(!m.is_combined());
        assert_eq!(m.animations[0].rows_per_direction, 2);
        assert_eq!(m.animations[0].sheet_file, "walk.png");
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let json = r#"{ "exportPrefix": "Hair_02", "pixelSize": 64, "animations": [] }"#;
        let err = Manifest::from_json(json, Path::new("bad/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().contains("bad/manifest.json"));
    }

    #[test]
    fn test_serialized_field_names() {
        let json = combined_manifest().to_json().unwrap();
        for key in [
            "\"exportPrefix\"",
            "\"pixelSize\"",
            "\"sortOrder\"",
            "\"sheetWidth\"",
            "\"maxFramesWidth\"",
            "\"combinedSpritesheet\"",
            "\"framesPerDirection\"",
            "\"spritesheet\"",
            "\"rowStart\"",
            "\"rowsPerDirection\"",
        ] {
            assert!(json.contains(key), "missing {} in {}", key, json);
        }
        assert!(!json.contains("groupName"));
    }

    #[test]
    fn test_valid_combined_manifest() {
        let m = combined_manifest();
        assert!(m.validate().is_empty(), "{:?}", m.validate());
        let reparsed = Manifest::from_json(&m.to_json().unwrap(), Path::new("m.json")).unwrap();
        assert_eq!(reparsed, m);
    }

    #[test]
    fn test_row_gap_rejected() {
        let mut m = combined_manifest();
        m.animations[1].row_start = 9;
        let issues = m.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "animations[1].rowStart");
    }

    #[test]
    fn test_rows_per_direction_must_match_wrap() {
        let mut m = combined_manifest();
        m.max_frames_width = 4;
        m.sheet_width = 4;
        // walk has 6 frames wrapped at 4: needs 2 rows per direction
        let issues = m.validate();
        assert!(issues.iter().any(|i| i.field == "animations[1].rowsPerDirection"));
    }

    #[test]
    fn test_narrow_combined_sheet_rejected() {
        let mut m = combined_manifest();
        m.sheet_width = 5;
        assert!(m.validate().iter().any(|i| i.field == "sheetWidth"));
    }

    #[test]
    fn test_duplicate_and_degenerate_entries() {
        let mut m = Manifest::new("Body", 0, 0);
        m.animations.push(entry("walk", 0, 0, "walk.png", 0));
        m.animations.push(entry("walk", 1, 1, "", 0));
        m.animations[0].fps = 0;
        let fields: Vec<String> = m.validate().into_iter().map(|i| i.field).collect();
        assert!(fields.contains(&"pixelSize".to_string()));
        assert!(fields.contains(&"animations[0].directions".to_string()));
        assert!(fields.contains(&"animations[0].framesPerDirection".to_string()));
        assert!(fields.contains(&"animations[0].fps".to_string()));
        assert!(fields.contains(&"animations[1].name".to_string()));
        assert!(fields.contains(&"animations[1].spritesheet".to_string()));
    }

    #[test]
    fn test_row_overflow_is_invalid() {
        let json = r#"{
            "exportPrefix": "Cape_Long",
            "pixelSize": 1,
            "sortOrder": 0,
            "sheetWidth": 0,
            "maxFramesWidth": 1,
            "animations": [{
                "name": "idle",
                "directions": ["S", "N"],
                "framesPerDirection": 4294967295,
                "fps": 12,
                "spritesheet": "idle.png",
                "rowStart": 0,
                "rowsPerDirection": 4294967295
            }]
        }"#;
        match Manifest::from_json(json, Path::new("manifest.json")).unwrap_err() {
            ManifestError::Invalid { issues, .. } => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "animations[0].rowsPerDirection");
                assert_eq!(issues[0].message, "sheet too large");
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_rows_overflowing_across_entries() {
        let mut m = Manifest::new("Cape_Long", 1, 0);
        m.max_frames_width = 1;
        m.animations.push(entry("idle", 1, u32::MAX, "cape.png", 0));
        m.animations[0].rows_per_direction = u32::MAX;
        m.animations.push(entry("walk", 1, 1, "cape.png", u32::MAX));

        assert!(m.sheets().is_err());
        let issues = m.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "animations[1].rowsPerDirection");
    }

    #[test]
    fn test_pixel_overflow_is_invalid() {
        let mut m = Manifest::new("Cape_Long", u32::MAX, 0);
        m.animations.push(entry("idle", 2, 1, "idle.png", 0));
        let issues = m.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "pixelSize");
    }

    #[test]
    fn test_path_like_names_rejected() {
        let mut m = Manifest::new("../../escaped", 16, 0);
        m.combined_sheet = Some("/tmp/sheet.png".to_string());
        m.sheet_width = 4;
        m.animations.push(entry("..", 1, 4, "/tmp/sheet.png", 0));
        m.animations[0].directions = vec!["S/../..".to_string()];
        m.animations.push(entry("walk", 1, 4, "sub\\walk.png", 1));

        let fields: Vec<String> = m.validate().into_iter().map(|i| i.field).collect();
        assert!(fields.contains(&"exportPrefix".to_string()));
        assert!(fields.contains(&"combinedSpritesheet".to_string()));
        assert!(fields.contains(&"animations[0].name".to_string()));
        assert!(fields.contains(&"animations[0].directions[0]".to_string()));
        assert!(fields.contains(&"animations[0].spritesheet".to_string()));
        assert!(fields.contains(&"animations[1].spritesheet".to_string()));
    }

    #[test]
    fn test_plain_names() {
        for name in ["Hair_Long", "idle.png", "Torso..v2", "N E"] {
            assert!(is_plain_name(name), "{}", name);
        }
        for name in ["..", ".", "a/b", "/abs", "a\\b", "C:x", "", "a\0"] {
            assert!(!is_plain_name(name), "{:?}", name);
        }
    }

    #[test]
    fn test_sheets_combined() {
        let sheets = combined_manifest().sheets().unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].file, "Torso_Leather.png");
        assert_eq!(sheets[0].entries, vec![0, 1]);
        assert_eq!(sheets[0].grid.total_rows, 16);
        assert_eq!(sheets[0].grid.columns, 6);
    }

    #[test]
    fn test_sheets_separate() {
        let mut m = Manifest::new("Legs", 16, 1);
        m.animations.push(entry("idle", 8, 4, "idle.png", 0));
        m.animations.push(entry("walk", 4, 6, "walk.png", 0));
        assert!(m.validate().is_empty());

        let sheets = m.sheets().unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!((sheets[0].grid.columns, sheets[0].grid.total_rows), (4, 8));
        assert_eq!((sheets[1].grid.columns, sheets[1].grid.total_rows), (6, 4));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Torso/Leather").join(MANIFEST_FILENAME);
        let m = combined_manifest();
        m.save(&path).unwrap();
        assert_eq!(Manifest::load(&path).unwrap(), m);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Manifest::load(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
