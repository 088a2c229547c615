// Reference shapes and difficulty-based selection.
//
// A `Shape` bundles a title, the difficulty tier it was drawn from, and the
// reference pixels players try to reproduce. Pixel data comes from a
// `ShapeProvider`, an opaque lookup keyed by title. The game never generates
// shape geometry itself; `catalog.rs` has the built-in provider the relay uses
// when nothing else is injected.
//
// `DifficultySelector` maps each tier to three candidate titles and draws one
// uniformly from the area's `GameRng`. A difficulty the selector does not
// recognize (any wire value outside Easy/Medium/Hard decodes to
// `Difficulty::Unknown`) yields no shape, and the caller keeps whatever shape
// it already had.

use crate::prng::GameRng;
use crate::types::Pixel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The named reference shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeTitle {
    Circle,
    Square,
    Star,
    Umbrella,
    House,
    #[serde(rename = "Christmas Tree")]
    ChristmasTree,
    Helicopter,
    Car,
    Husky,
}

impl ShapeTitle {
    pub const ALL: [ShapeTitle; 9] = [
        ShapeTitle::Circle,
        ShapeTitle::Square,
        ShapeTitle::Star,
        ShapeTitle::Umbrella,
        ShapeTitle::House,
        ShapeTitle::ChristmasTree,
        ShapeTitle::Helicopter,
        ShapeTitle::Car,
        ShapeTitle::Husky,
    ];
}

impl fmt::Display for ShapeTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeTitle::Circle => "Circle",
            ShapeTitle::Square => "Square",
            ShapeTitle::Star => "Star",
            ShapeTitle::Umbrella => "Umbrella",
            ShapeTitle::House => "House",
            ShapeTitle::ChristmasTree => "Christmas Tree",
            ShapeTitle::Helicopter => "Helicopter",
            ShapeTitle::Car => "Car",
            ShapeTitle::Husky => "Husky",
        };
        f.write_str(name)
    }
}

/// Difficulty tier. `Unknown` absorbs any unrecognized wire value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    #[serde(other)]
    Unknown,
}

impl Difficulty {
    /// Candidate titles for this tier. Empty for `Unknown`.
    pub fn candidates(self) -> &'static [ShapeTitle] {
        match self {
            Difficulty::Easy => &[ShapeTitle::Circle, ShapeTitle::Square, ShapeTitle::Star],
            Difficulty::Medium => &[
                ShapeTitle::Umbrella,
                ShapeTitle::House,
                ShapeTitle::ChristmasTree,
            ],
            Difficulty::Hard => &[ShapeTitle::Helicopter, ShapeTitle::Car, ShapeTitle::Husky],
            Difficulty::Unknown => &[],
        }
    }
}

/// An immutable reference shape for one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    title: ShapeTitle,
    difficulty: Difficulty,
    pixels: Vec<Pixel>,
}

impl Shape {
    pub fn new(title: ShapeTitle, difficulty: Difficulty, pixels: Vec<Pixel>) -> Self {
        Self {
            title,
            difficulty,
            pixels,
        }
    }

    pub fn title(&self) -> ShapeTitle {
        self.title
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Source of canonical pixel data for each shape title. Must return the same
/// pixels for the same title every time.
pub trait ShapeProvider {
    fn pixels(&self, title: ShapeTitle) -> Vec<Pixel>;
}

/// A provider backed by a fixed table, e.g. loaded from a JSON asset.
/// Titles missing from the table have no pixels.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixedShapes {
    shapes: BTreeMap<ShapeTitle, Vec<Pixel>>,
}

impl FixedShapes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, title: ShapeTitle, pixels: Vec<Pixel>) -> Self {
        self.shapes.insert(title, pixels);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ShapeProvider for FixedShapes {
    fn pixels(&self, title: ShapeTitle) -> Vec<Pixel> {
        self.shapes.get(&title).cloned().unwrap_or_default()
    }
}

/// Shared handle to a provider. Areas hosted by the same relay share one.
pub type SharedShapeProvider = Arc<dyn ShapeProvider + Send + Sync>;

/// Picks a random shape for a difficulty tier.
#[derive(Clone)]
pub struct DifficultySelector {
    provider: SharedShapeProvider,
}

impl DifficultySelector {
    pub fn new(provider: SharedShapeProvider) -> Self {
        Self { provider }
    }

    /// Draw a title uniformly from the tier's candidates and fetch its
    /// pixels. `None` if the tier has no candidates.
    pub fn select_shape(&self, difficulty: Difficulty, rng: &mut GameRng) -> Option<Shape> {
        let title = *rng.choose(difficulty.candidates())?;
        Some(Shape::new(title, difficulty, self.provider.pixels(title)))
    }
}

impl fmt::Debug for DifficultySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifficultySelector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn selector() -> DifficultySelector {
        let mut shapes = FixedShapes::new();
        for (i, title) in ShapeTitle::ALL.into_iter().enumerate() {
            shapes = shapes.with(title, vec![Pixel::new(i as f64, i as f64)]);
        }
        DifficultySelector::new(Arc::new(shapes))
    }

    #[test]
    fn every_tier_stays_in_its_candidates_and_covers_them() {
        let selector = selector();
        let mut rng = GameRng::new(31);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let mut seen = BTreeSet::new();
            for _ in 0..300 {
                let shape = selector.select_shape(difficulty, &mut rng).unwrap();
                assert!(difficulty.candidates().contains(&shape.title()));
                assert_eq!(shape.difficulty(), difficulty);
                seen.insert(shape.title());
            }
            assert_eq!(seen.len(), 3, "{difficulty:?} should reach all candidates");
        }
    }

    #[test]
    fn shape_carries_provider_pixels() {
        let selector = selector();
        let mut rng = GameRng::new(4);
        let shape = selector.select_shape(Difficulty::Hard, &mut rng).unwrap();
        let index = ShapeTitle::ALL
            .iter()
            .position(|t| *t == shape.title())
            .unwrap();
        assert_eq!(shape.pixels(), &[Pixel::new(index as f64, index as f64)]);
    }

    #[test]
    fn unknown_difficulty_selects_nothing() {
        let selector = selector();
        let mut rng = GameRng::new(4);
        assert!(selector.select_shape(Difficulty::Unknown, &mut rng).is_none());
    }

    #[test]
    fn unrecognized_wire_difficulty_decodes_to_unknown() {
        let d: Difficulty = serde_json::from_str("\"Impossible\"").unwrap();
        assert_eq!(d, Difficulty::Unknown);
        let d: Difficulty = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(d, Difficulty::Medium);
    }

    #[test]
    fn christmas_tree_wire_name_has_a_space() {
        let json = serde_json::to_string(&ShapeTitle::ChristmasTree).unwrap();
        assert_eq!(json, "\"Christmas Tree\"");
        assert_eq!(ShapeTitle::ChristmasTree.to_string(), "Christmas Tree");
    }

    #[test]
    fn fixed_shapes_missing_title_is_empty() {
        let shapes = FixedShapes::new().with(ShapeTitle::Star, vec![Pixel::new(1.0, 2.0)]);
        assert!(shapes.pixels(ShapeTitle::Car).is_empty());
        assert_eq!(shapes.pixels(ShapeTitle::Star).len(), 1);
    }
}
