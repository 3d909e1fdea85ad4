//! Heuristic mapping from catalog metadata to the 9 trait dimensions.
//!
//! ## Algorithm
//! 1. Sum genre weights per dimension
//! 2. Add keyword weights (case-insensitive substring match on each keyword)
//! 3. Squash every sum into [0, 1) with `1 - e^-x`
//! 4. Nudge mood and optimism by rating quality, energy by popularity

use taste::{Trait, TraitVector, DIMENSIONS};

type Weights = &'static [(Trait, f64)];

const GENRE_WEIGHTS: &[(&str, Weights)] = &[
    ("action", &[(Trait::Energy, 0.8), (Trait::Intensity, 0.6)]),
    ("adventure", &[(Trait::Energy, 0.6), (Trait::Novelty, 0.4)]),
    (
        "animation",
        &[(Trait::Comfort, 0.5), (Trait::Optimism, 0.3), (Trait::Humor, 0.3)],
    ),
    ("comedy", &[(Trait::Humor, 0.9), (Trait::Optimism, 0.3)]),
    ("crime", &[(Trait::Darkness, 0.5), (Trait::Intensity, 0.5)]),
    ("documentary", &[(Trait::Depth, 0.7)]),
    ("drama", &[(Trait::Depth, 0.6)]),
    ("family", &[(Trait::Comfort, 0.9), (Trait::Optimism, 0.2)]),
    ("fantasy", &[(Trait::Novelty, 0.6), (Trait::Mood, 0.2)]),
    ("history", &[(Trait::Depth, 0.5)]),
    ("horror", &[(Trait::Darkness, 0.9), (Trait::Intensity, 0.7)]),
    ("music", &[(Trait::Mood, 0.4), (Trait::Optimism, 0.3)]),
    ("mystery", &[(Trait::Intensity, 0.6), (Trait::Darkness, 0.3)]),
    (
        "romance",
        &[(Trait::Mood, 0.5), (Trait::Optimism, 0.5), (Trait::Comfort, 0.2)],
    ),
    ("science fiction", &[(Trait::Novelty, 0.8), (Trait::Energy, 0.3)]),
    ("tv movie", &[(Trait::Comfort, 0.3)]),
    ("thriller", &[(Trait::Intensity, 0.8), (Trait::Darkness, 0.6)]),
    (
        "war",
        &[(Trait::Intensity, 0.8), (Trait::Darkness, 0.6), (Trait::Depth, 0.3)],
    ),
    ("western", &[(Trait::Novelty, 0.3), (Trait::Depth, 0.2)]),
];

const KEYWORD_WEIGHTS: &[(&str, Weights)] = &[
    ("feel good", &[(Trait::Comfort, 0.8), (Trait::Optimism, 0.7)]),
    ("uplifting", &[(Trait::Optimism, 0.9), (Trait::Mood, 0.4)]),
    ("friendship", &[(Trait::Comfort, 0.6)]),
    ("christmas", &[(Trait::Comfort, 0.9), (Trait::Optimism, 0.3)]),
    ("family", &[(Trait::Comfort, 0.7)]),
    ("satire", &[(Trait::Humor, 0.7)]),
    ("parody", &[(Trait::Humor, 0.8)]),
    ("stand-up", &[(Trait::Humor, 0.9)]),
    ("buddy", &[(Trait::Humor, 0.5), (Trait::Comfort, 0.2)]),
    ("dystopia", &[(Trait::Darkness, 0.8), (Trait::Novelty, 0.4)]),
    ("serial killer", &[(Trait::Darkness, 0.8), (Trait::Intensity, 0.7)]),
    ("tragic", &[(Trait::Darkness, 0.6), (Trait::Depth, 0.3)]),
    ("noir", &[(Trait::Darkness, 0.7), (Trait::Intensity, 0.5)]),
    ("car chase", &[(Trait::Energy, 0.7), (Trait::Intensity, 0.7)]),
    ("martial arts", &[(Trait::Energy, 0.7)]),
    ("heist", &[(Trait::Energy, 0.6), (Trait::Intensity, 0.5)]),
    ("time travel", &[(Trait::Novelty, 0.9)]),
    ("cyberpunk", &[(Trait::Novelty, 0.8), (Trait::Darkness, 0.3)]),
    ("multiverse", &[(Trait::Novelty, 0.9)]),
    ("space", &[(Trait::Novelty, 0.7)]),
    ("character study", &[(Trait::Depth, 0.8)]),
    ("biography", &[(Trait::Depth, 0.6)]),
    ("philosophy", &[(Trait::Depth, 0.8)]),
];

fn add(sums: &mut [f64; DIMENSIONS], weights: Weights) {
    for &(t, w) in weights {
        sums[t.index()] += w;
    }
}

/// Derive an item trait vector from catalog metadata.
///
/// # Arguments
/// * `genres` - Genre names (matched case-insensitively)
/// * `keywords` - Free-form keywords, matched by substring
/// * `vote_average` - Average rating on a 0-10 scale
/// * `popularity` - Provider popularity, roughly 0-300
pub fn traits_from_metadata(
    genres: &[String],
    keywords: &[String],
    vote_average: f64,
    popularity: f64,
) -> TraitVector {
    let mut sums = [0.0; DIMENSIONS];

    for genre in genres {
        let genre = genre.trim().to_lowercase();
        if let Some((_, weights)) = GENRE_WEIGHTS.iter().find(|(name, _)| *name == genre) {
            add(&mut sums, *weights);
        }
    }

    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    for (needle, weights) in KEYWORD_WEIGHTS {
        if keywords.iter().any(|k| k.contains(needle)) {
            add(&mut sums, *weights);
        }
    }

    let mut traits = TraitVector::new(sums.map(|x| 1.0 - (-x).exp()));

    let quality = (vote_average / 10.0).clamp(0.0, 1.0);
    let popularity = (popularity / 300.0).clamp(0.0, 1.0);
    traits.set(Trait::Mood, traits.get(Trait::Mood) + 0.15 * quality);
    traits.set(Trait::Optimism, traits.get(Trait::Optimism) + 0.1 * quality);
    traits.set(Trait::Energy, traits.get(Trait::Energy) + 0.05 * popularity);
    traits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_metadata_is_all_zero() {
        let traits = traits_from_metadata(&[], &[], 0.0, 0.0);
        for (_, v) in traits.iter() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_genres_drive_their_dimensions() {
        let traits = traits_from_metadata(&strings(&["Horror", "Thriller"]), &[], 0.0, 0.0);
        assert!(traits.get(Trait::Darkness) > 0.7);
        assert!(traits.get(Trait::Intensity) > 0.7);
        assert_eq!(traits.get(Trait::Humor), 0.0);
    }

    #[test]
    fn test_keywords_match_by_substring() {
        let traits =
            traits_from_metadata(&[], &strings(&["Time Travel Paradox"]), 0.0, 0.0);
        let expected = 1.0 - (-0.9f64).exp();
        assert!((traits.get(Trait::Novelty) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_quality_and_popularity_bias() {
        let traits = traits_from_metadata(&[], &[], 10.0, 600.0);
        assert!((traits.get(Trait::Mood) - 0.15).abs() < 1e-9);
        assert!((traits.get(Trait::Optimism) - 0.1).abs() < 1e-9);
        assert!((traits.get(Trait::Energy) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_values_stay_in_unit_range() {
        let traits = traits_from_metadata(
            &strings(&["Comedy", "Family", "Animation", "Romance"]),
            &strings(&["feel good", "christmas", "family", "friendship", "buddy"]),
            10.0,
            300.0,
        );
        for (_, v) in traits.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
