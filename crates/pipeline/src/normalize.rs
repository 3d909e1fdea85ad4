//! Canonicalizes raw retrieval records into `Candidate`s.
//!
//! This is the one place where defaults are filled in:
//! - traits come from `traits`, else the older `vector` field, else neutral (0.5 everywhere)
//! - a non-finite `match` score is dropped so the reranker recomputes it
//! - a missing id is derived from the title and year
//! - a record with neither id nor title cannot be identified and is skipped

use catalog::{Candidate, CandidateMetadata, ItemId, RawCandidate};
use taste::TraitVector;
use tracing::warn;

/// Normalize a single record; `None` when it cannot be identified.
pub fn normalize_one(raw: RawCandidate) -> Option<Candidate> {
    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let id = match (raw.id.as_ref().and_then(|id| id.to_item_id()), &title) {
        (Some(id), _) => id,
        (None, Some(title)) => derived_id(title, raw.year),
        (None, None) => return None,
    };

    let traits = raw.traits.or(raw.vector).unwrap_or_else(TraitVector::neutral);

    Some(Candidate {
        title: title.unwrap_or_else(|| id.to_string()),
        id,
        year: raw.year,
        traits,
        score: raw.match_score.filter(|s| s.is_finite()),
        metadata: CandidateMetadata {
            poster_url: raw.poster_url,
            synopsis: raw.synopsis,
            providers: raw.providers,
            genres: raw.genres,
            director: raw.director,
        },
    })
}

/// Lazily normalize a raw pool, skipping and logging records without identity.
pub fn normalize<I>(raw: I) -> impl Iterator<Item = Candidate>
where
    I: IntoIterator<Item = RawCandidate>,
{
    raw.into_iter().filter_map(|record| {
        let candidate = normalize_one(record);
        if candidate.is_none() {
            warn!("Skipping candidate without id or title");
        }
        candidate
    })
}

fn derived_id(title: &str, year: Option<i32>) -> ItemId {
    let slug = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    match year {
        Some(year) => ItemId::new(format!("{slug}-{year}")),
        None => ItemId::new(slug),
    }
}
