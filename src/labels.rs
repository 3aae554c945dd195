//! Disease class labels and their fitted ordering
//!
//! The classifier was trained against a fixed class order; the index-to-label
//! mapping here is a persisted external contract shared by the vector
//! assembler and the classification adapter. Reordering the variants silently
//! corrupts predictions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six rice leaf conditions, in the classifier's fitted class order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseClass {
    BacterialLeafBlight,
    BrownSpot,
    Healthy,
    LeafBlast,
    LeafScald,
    NarrowBrownSpot,
}

/// Class names in fitted order, as the presentation shell displays them
pub const CLASS_NAMES: [&str; DiseaseClass::COUNT] = [
    "bacterial_leaf_blight",
    "brown_spot",
    "healthy",
    "leaf_blast",
    "leaf_scald",
    "narrow_brown_spot",
];

impl DiseaseClass {
    /// Number of classes the classifier was fitted with
    pub const COUNT: usize = 6;

    /// All classes, in fitted order
    pub const ALL: [Self; Self::COUNT] = [
        Self::BacterialLeafBlight,
        Self::BrownSpot,
        Self::Healthy,
        Self::LeafBlast,
        Self::LeafScald,
        Self::NarrowBrownSpot,
    ];

    /// The class at the given fitted index
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The fitted index of this class
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The snake_case label string for this class
    #[must_use]
    pub fn as_str(self) -> &'static str {
        CLASS_NAMES[self.index()]
    }

    /// Whether this class represents a healthy leaf
    #[must_use]
    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }
}

impl fmt::Display for DiseaseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
