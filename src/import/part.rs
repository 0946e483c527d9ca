//! Runtime frame collections rebuilt from sliced sheets.

use image::{imageops, RgbaImage};
use serde::Serialize;

/// All frames of one direction, in frame order.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionFrames {
    pub direction: String,
    pub frames: Vec<RgbaImage>,
}

/// One animation of one part, directions in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrames {
    pub name: String,
    pub fps: u32,
    pub directions: Vec<DirectionFrames>,
}

impl AnimationFrames {
    pub fn direction_count(&self) -> usize {
        self.directions.len()
    }

    /// Frames per direction (every direction holds the same count).
    pub fn frame_count(&self) -> usize {
        self.directions.first().map_or(0, |d| d.frames.len())
    }

    /// Frame `frame` of direction `direction`.
    pub fn sprite(&self, direction: usize, frame: usize) -> Option<&RgbaImage> {
        self.directions.get(direction)?.frames.get(frame)
    }

    /// Look up a direction by label.
    pub fn direction(&self, label: &str) -> Option<&DirectionFrames> {
        self.directions.iter().find(|d| d.direction == label)
    }
}

/// One imported character part.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDefinition {
    pub part_name: String,
    pub group_name: Option<String>,
    pub sort_order: i32,
    pub pixel_size: u32,
    pub animations: Vec<AnimationFrames>,
}

impl PartDefinition {
    pub fn animation(&self, name: &str) -> Option<&AnimationFrames> {
        self.animations.iter().find(|a| a.name == name)
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animation(name).is_some()
    }

    pub fn animation_names(&self) -> Vec<&str> {
        self.animations.iter().map(|a| a.name.as_str()).collect()
    }

    /// Pixel-free description written next to the imported frames.
    pub fn summary(&self) -> PartSummary {
        PartSummary {
            part_name: self.part_name.clone(),
            group_name: self.group_name.clone(),
            sort_order: self.sort_order,
            pixel_size: self.pixel_size,
            animations: self
                .animations
                .iter()
                .map(|a| AnimationSummary {
                    name: a.name.clone(),
                    fps: a.fps,
                    frames_per_direction: a.frame_count(),
                    directions: a.directions.iter().map(|d| d.direction.clone()).collect(),
                })
                .collect(),
        }
    }
}

/// Serializable view of a [`PartDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartSummary {
    pub part_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub sort_order: i32,
    pub pixel_size: u32,
    pub animations: Vec<AnimationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSummary {
    pub name: String,
    pub fps: u32,
    pub frames_per_direction: usize,
    pub directions: Vec<String>,
}

/// Serializable layer list of a [`LayeredCharacter`], back to front.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
    pub layers: Vec<LayerSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub part_name: String,
    pub sort_order: i32,
    pub animations: Vec<String>,
}

/// Parts stacked for rendering, lowest `sort_order` at the back.
///
/// Parts with equal sort order keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct LayeredCharacter {
    parts: Vec<PartDefinition>,
}

impl LayeredCharacter {
    pub fn new(mut parts: Vec<PartDefinition>) -> Self {
        parts.sort_by_key(|p| p.sort_order);
        Self { parts }
    }

    /// Parts back to front.
    pub fn parts(&self) -> &[PartDefinition] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Replace the part at `index` and restore layer order.
    ///
    /// Returns the replaced part, or `None` (leaving the stack untouched) when
    /// `index` is out of range.
    pub fn set_part(&mut self, index: usize, part: PartDefinition) -> Option<PartDefinition> {
        let slot = self.parts.get_mut(index)?;
        let old = std::mem::replace(slot, part);
        self.parts.sort_by_key(|p| p.sort_order);
        Some(old)
    }

    /// Images for one frame, back to front. Parts lacking the frame are skipped.
    pub fn layers(&self, animation: &str, direction: usize, frame: usize) -> Vec<&RgbaImage> {
        self.parts
            .iter()
            .filter_map(|p| p.animation(animation)?.sprite(direction, frame))
            .collect()
    }

    /// Alpha-composite one frame of every part.
    pub fn composite(&self, animation: &str, direction: usize, frame: usize) -> Option<RgbaImage> {
        let layers = self.layers(animation, direction, frame);
        let (first, rest) = layers.split_first()?;
        let mut canvas = RgbaImage::new(first.width(), first.height());
        imageops::overlay(&mut canvas, *first, 0, 0);
        for layer in rest {
            imageops::overlay(&mut canvas, *layer, 0, 0);
        }
        Some(canvas)
    }

    pub fn summary(&self) -> CharacterSummary {
        CharacterSummary {
            layers: self
                .parts
                .iter()
                .map(|p| LayerSummary {
                    part_name: p.part_name.clone(),
                    sort_order: p.sort_order,
                    animations: p.animation_names().into_iter().map(String::from).collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn part(name: &str, sort_order: i32, color: [u8; 4]) -> PartDefinition {
        let frame = RgbaImage::from_pixel(2, 2, Rgba(color));
        PartDefinition {
            part_name: name.to_string(),
            group_name: None,
            sort_order,
            pixel_size: 2,
            animations: vec![AnimationFrames {
                name: "idle".to_string(),
                fps: 12,
                directions: vec![
                    DirectionFrames { direction: "S".to_string(), frames: vec![frame.clone()] },
                    DirectionFrames { direction: "N".to_string(), frames: vec![frame] },
                ],
            }],
        }
    }

    #[test]
    fn test_animation_lookups() {
        let body = part("Body_Base", 0, [1, 2, 3, 255]);
        assert!(body.has_animation("idle"));
        assert!(!body.has_animation("walk"));

        let idle = body.animation("idle").unwrap();
        assert_eq!(idle.direction_count(), 2);
        assert_eq!(idle.frame_count(), 1);
        assert!(idle.sprite(1, 0).is_some());
        assert!(idle.sprite(2, 0).is_none());
        assert_eq!(idle.direction("N").unwrap().frames.len(), 1);
    }

    #[test]
    fn test_layers_sorted_back_to_front() {
        let character = LayeredCharacter::new(vec![
            part("Hair_Long", 7, [0, 0, 255, 255]),
            part("Body_Base", 0, [255, 0, 0, 255]),
            part("Torso_Leather", 3, [0, 255, 0, 255]),
        ]);
        let names: Vec<_> = character.parts().iter().map(|p| p.part_name.as_str()).collect();
        assert_eq!(names, vec!["Body_Base", "Torso_Leather", "Hair_Long"]);
        assert_eq!(character.layers("idle", 0, 0).len(), 3);
        assert!(character.layers("walk", 0, 0).is_empty());
    }

    #[test]
    fn test_equal_sort_order_keeps_insertion_order() {
        let character = LayeredCharacter::new(vec![
            part("Weapon_Sword", 5, [0, 0, 0, 255]),
            part("Shield_Round", 5, [0, 0, 0, 255]),
        ]);
        assert_eq!(character.parts()[0].part_name, "Weapon_Sword");
    }

    #[test]
    fn test_composite_front_layer_wins() {
        let character = LayeredCharacter::new(vec![
            part("Hair_Long", 7, [0, 0, 255, 255]),
            part("Body_Base", 0, [255, 0, 0, 255]),
        ]);
        let frame = character.composite("idle", 0, 0).unwrap();
        assert_eq!(*frame.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert!(character.composite("run", 0, 0).is_none());
    }

    #[test]
    fn test_composite_transparent_front_layer() {
        let character = LayeredCharacter::new(vec![
            part("Body_Base", 0, [255, 0, 0, 255]),
            part("Hair_None", 7, [0, 0, 0, 0]),
        ]);
        let frame = character.composite("idle", 0, 0).unwrap();
        assert_eq!(*frame.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_set_part_resorts() {
        let mut character = LayeredCharacter::new(vec![
            part("Body_Base", 0, [255, 0, 0, 255]),
            part("Hair_Long", 7, [0, 0, 255, 255]),
        ]);
        let old = character.set_part(0, part("Helmet_Iron", 8, [9, 9, 9, 255])).unwrap();
        assert_eq!(old.part_name, "Body_Base");
        assert_eq!(character.parts()[1].part_name, "Helmet_Iron");
        assert!(character.set_part(5, part("X", 0, [0, 0, 0, 0])).is_none());
        assert_eq!(character.len(), 2);
    }

    #[test]
    fn test_summaries_serialize_camel_case() {
        let body = part("Body_Base", 0, [1, 2, 3, 255]);
        let json = serde_json::to_value(body.summary()).unwrap();
        assert_eq!(json["partName"], "Body_Base");
        assert_eq!(json["animations"][0]["framesPerDirection"], 1);
        assert_eq!(json["animations"][0]["directions"][1], "N");
        assert!(json.get("groupName").is_none());

        let character = LayeredCharacter::new(vec![body]);
        let json = serde_json::to_value(character.summary()).unwrap();
        assert_eq!(json["layers"][0]["sortOrder"], 0);
    }
}
