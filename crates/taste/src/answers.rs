//! Quiz answers -> user trait vector.
//!
//! The quiz asks its nine questions in a different order than the canonical
//! vector layout, so answers are mapped by position through `QUIZ_ORDER`.
//!
//! ## Scaling
//! Each answer is brought into [0, 1] by the first rule that matches:
//! - already in [0, 1]: kept as is
//! - in (1, 5]: a 1-5 Likert answer, mapped with `(v - 1) / 4`
//! - in (5, 100]: a percentage, mapped with `v / 100`
//! - anything else: clamped

use crate::error::{Result, TasteError};
use crate::vector::{clamp01, Trait, TraitVector, DIMENSIONS};

/// Dimension answered by each quiz position
pub const QUIZ_ORDER: [Trait; DIMENSIONS] = [
    Trait::Darkness,
    Trait::Energy,
    Trait::Mood,
    Trait::Depth,
    Trait::Optimism,
    Trait::Novelty,
    Trait::Comfort,
    Trait::Intensity,
    Trait::Humor,
];

fn scale_answer(v: f64) -> f64 {
    if (0.0..=1.0).contains(&v) {
        v
    } else if v > 1.0 && v <= 5.0 {
        (v - 1.0) / 4.0
    } else if v > 5.0 && v <= 100.0 {
        v / 100.0
    } else {
        clamp01(v)
    }
}

/// Map nine quiz answers onto a user trait vector.
///
/// # Errors
/// Rejects input with the wrong number of answers or with a non-finite value.
/// Nothing is computed for rejected input.
pub fn answers_to_traits(answers: &[f64]) -> Result<TraitVector> {
    if answers.len() != DIMENSIONS {
        return Err(TasteError::AnswerCountMismatch {
            expected: DIMENSIONS,
            found: answers.len(),
        });
    }
    if let Some((index, value)) = answers.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(TasteError::NonNumericAnswer {
            index,
            value: value.to_string(),
        });
    }

    Ok(TraitVector::from_partial(
        QUIZ_ORDER
            .into_iter()
            .zip(answers.iter().map(|&v| scale_answer(v))),
    ))
}

/// Parse a comma separated answer list such as `"0.8,0.2,5,..."`.
pub fn parse_answers(input: &str) -> Result<Vec<f64>> {
    input
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(index, raw)| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TasteError::NonNumericAnswer {
                    index,
                    value: raw.to_string(),
                })
        })
        .collect()
}
