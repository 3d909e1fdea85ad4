//! Human-readable summary of a user's trait profile.
//!
//! ## Algorithm
//! 1. Pick an archetype from the first matching threshold rule
//! 2. Describe the current feel: energy word and novelty/comfort tilt
//! 3. Describe what will land: tone bits, pace, emotional weight, brightness
//! 4. Join the three sentences

use crate::vector::{Trait, TraitVector};
use serde::{Deserialize, Serialize};

/// Archetype plus the three-sentence description shown with recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub archetype: String,
    pub text: String,
}

fn archetype(t: &TraitVector) -> (&'static str, &'static str) {
    let g = |d: Trait| t.get(d);

    if g(Trait::Energy) > 0.66 && g(Trait::Novelty) > 0.62 {
        ("The Spark", "high-energy, curious, and up for something new")
    } else if g(Trait::Comfort) > 0.66 && g(Trait::Depth) > 0.60 {
        ("The Cozy Thinker", "reflective and drawn to warm, thoughtful stories")
    } else if g(Trait::Intensity) > 0.66 && g(Trait::Darkness) > 0.60 {
        ("The Edge Seeker", "bold with feelings and unafraid of the shadows")
    } else if g(Trait::Humor) > 0.66 && g(Trait::Novelty) > 0.60 {
        ("The Lighthearted Adventurer", "playful, witty, and open to fresh twists")
    } else if g(Trait::Optimism) > 0.70 && g(Trait::Humor) > 0.60 {
        ("The Warm Optimist", "you favor heart, hope, and clever charm")
    } else if g(Trait::Depth) > 0.68 && g(Trait::Mood) < 0.55 {
        ("The Grounded Dreamer", "steady, thoughtful, and moved by meaning")
    } else {
        ("Beautifully Balanced", "you appreciate a mix of tones and tempos")
    }
}

/// Build the profile summary for a user trait vector
pub fn summarize(traits: &TraitVector) -> ProfileSummary {
    let g = |d: Trait| traits.get(d);
    let (name, tagline) = archetype(traits);

    let energy_word = if g(Trait::Energy) >= 0.60 { "charged" } else { "calm" };
    let tilt = if (g(Trait::Novelty) - g(Trait::Comfort)).abs() >= 0.12 {
        if g(Trait::Novelty) > g(Trait::Comfort) {
            "leaning toward novelty"
        } else {
            "leaning toward comfort"
        }
    } else {
        "open to either comfort or surprise"
    };

    let mut tone_bits = Vec::new();
    if g(Trait::Humor) >= 0.60 {
        tone_bits.push("witty");
    }
    if g(Trait::Depth) >= 0.60 {
        tone_bits.push("introspective");
    }
    if g(Trait::Intensity) >= 0.60 {
        tone_bits.push("intense");
    }
    if tone_bits.is_empty() {
        tone_bits.push("easy-to-settle-into");
    }

    let pace = if g(Trait::Energy) >= 0.60 { "brisk" } else { "unhurried" };
    let weight = if g(Trait::Intensity) >= 0.55 {
        "emotionally full"
    } else {
        "gentle"
    };
    let brightness = if g(Trait::Optimism) >= 0.60 && g(Trait::Darkness) < 0.55 {
        "with a hope-forward glow"
    } else if g(Trait::Darkness) >= 0.60 {
        "with a shadow-tinged edge"
    } else {
        "balanced between light and shade"
    };

    let text = format!(
        "You're {name}: {tagline}. Today you feel {energy_word}, {tilt}. \
         You'll vibe with {} stories that feel {pace} and {weight}, {brightness}.",
        tone_bits.join(", ")
    );

    ProfileSummary {
        archetype: name.to_string(),
        text,
    }
}
