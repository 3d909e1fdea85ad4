//! The 9-dimensional trait vector and cosine similarity over it.
//!
//! User vectors (from quiz answers) and item vectors (from catalog metadata)
//! share this one representation. The dimension order below is fixed, which
//! is what lets two vectors be compared positionally.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of trait dimensions
pub const DIMENSIONS: usize = 9;

/// Value used for any dimension that is missing from a record
pub const NEUTRAL: f64 = 0.5;

/// One named trait dimension, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trait {
    Energy,
    Mood,
    Depth,
    Optimism,
    Novelty,
    Comfort,
    Intensity,
    Humor,
    Darkness,
}

impl Trait {
    /// All dimensions in canonical (positional) order
    pub const ALL: [Trait; DIMENSIONS] = [
        Trait::Energy,
        Trait::Mood,
        Trait::Depth,
        Trait::Optimism,
        Trait::Novelty,
        Trait::Comfort,
        Trait::Intensity,
        Trait::Humor,
        Trait::Darkness,
    ];

    /// Position of this dimension inside a `TraitVector`
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Trait::Energy => "energy",
            Trait::Mood => "mood",
            Trait::Depth => "depth",
            Trait::Optimism => "optimism",
            Trait::Novelty => "novelty",
            Trait::Comfort => "comfort",
            Trait::Intensity => "intensity",
            Trait::Humor => "humor",
            Trait::Darkness => "darkness",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Trait> {
        let name = name.trim();
        Trait::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Truncate a value to [0, 1]. NaN maps to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Cosine similarity of two trait vectors, in [-1, 1].
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn similarity(a: &TraitVector, b: &TraitVector) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.0.iter().zip(b.0.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Fixed-order vector of 9 trait values, each clamped to [0, 1].
///
/// The inner array is private so that every way of building a vector goes
/// through clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitVector([f64; DIMENSIONS]);

impl TraitVector {
    /// Build from positional values, clamping each to [0, 1]
    pub fn new(values: [f64; DIMENSIONS]) -> Self {
        Self(values.map(clamp01))
    }

    /// Every dimension at the neutral midpoint
    pub fn neutral() -> Self {
        Self([NEUTRAL; DIMENSIONS])
    }

    /// Build from a positional slice of any length.
    ///
    /// Missing trailing positions take the neutral value, extra ones are ignored.
    pub fn from_slice(values: &[f64]) -> Self {
        let mut out = [NEUTRAL; DIMENSIONS];
        for (slot, v) in out.iter_mut().zip(values.iter()) {
            *slot = clamp01(*v);
        }
        Self(out)
    }

    /// Build from named values; dimensions not mentioned stay neutral
    pub fn from_partial<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (Trait, f64)>,
    {
        let mut vector = Self::neutral();
        for (t, v) in values {
            vector.set(t, v);
        }
        vector
    }

    pub fn get(&self, t: Trait) -> f64 {
        self.0[t.index()]
    }

    pub fn set(&mut self, t: Trait, value: f64) {
        self.0[t.index()] = clamp01(value);
    }

    pub fn as_array(&self) -> &[f64; DIMENSIONS] {
        &self.0
    }

    /// Iterate `(dimension, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Trait, f64)> + '_ {
        Trait::ALL.into_iter().zip(self.0.iter().copied())
    }

    /// Cosine similarity to another vector, see [`similarity`]
    pub fn similarity(&self, other: &TraitVector) -> f64 {
        similarity(self, other)
    }
}

impl Default for TraitVector {
    fn default() -> Self {
        Self::neutral()
    }
}

// Serialized as a name -> value map in canonical order.
impl Serialize for TraitVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DIMENSIONS))?;
        for (t, v) in self.iter() {
            map.serialize_entry(t.name(), &v)?;
        }
        map.end()
    }
}

// Accepts either the named map or a positional list. Absent, null or unknown
// entries fall back to the neutral value.
impl<'de> Deserialize<'de> for TraitVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named(HashMap<String, Option<f64>>),
            Positional(Vec<Option<f64>>),
        }

        let vector = match Repr::deserialize(deserializer)? {
            Repr::Named(map) => TraitVector::from_partial(
                map.into_iter()
                    .filter_map(|(k, v)| Some((Trait::from_name(&k)?, v?))),
            ),
            Repr::Positional(values) => {
                let mut out = TraitVector::neutral();
                for (t, v) in Trait::ALL.into_iter().zip(values) {
                    if let Some(v) = v {
                        out.set(t, v);
                    }
                }
                out
            }
        };
        Ok(vector)
    }
}
