//! Similarity scoring for backend hits.
//!
//! Backend relevance scores are opaque and only comparable within one
//! result set. To turn them into percentages the scorer measures one real
//! fuzzy similarity and scales every other hit proportionally:
//!
//! 1. The anchor is the first hit (in backend order) with the maximum raw score.
//! 2. `anchor_similarity = token_set_ratio(anchor.source_text, query)`.
//! 3. `similarity = round(anchor_similarity * raw_score / anchor.raw_score, 2)`.
//!
//! One string comparison per lookup instead of one per hit.

use rapidfuzz::distance::indel;
use std::collections::BTreeSet;

use crate::error::{Result, TmError};
use crate::models::SearchHit;

/// Token-order-independent similarity of two strings on a 0–100 scale.
///
/// Both inputs are lowercased and every non-alphanumeric character becomes
/// a separator. The token sets are split into their sorted intersection and
/// the two sorted differences; the result is the best indel ratio between
/// `intersection`, `intersection + diff(a)` and `intersection + diff(b)`.
/// Returns 0 when either string has no tokens.
///
/// Processing is Unicode-aware: `Größe` and `文件` are kept as tokens.
/// fuzzywuzzy's `token_set_ratio` strips non-ASCII characters by default
/// (`force_ascii=True`), so scores for non-Latin text differ from it.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let processed_a = process(a);
    let processed_b = process(b);
    if processed_a.is_empty() || processed_b.is_empty() {
        return 0.0;
    }

    let tokens_a: BTreeSet<&str> = processed_a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = processed_b.split_whitespace().collect();

    let intersection = join(tokens_a.intersection(&tokens_b));
    let only_a = join(tokens_a.difference(&tokens_b));
    let only_b = join(tokens_b.difference(&tokens_a));

    let combined_a = format!("{} {}", intersection, only_a).trim().to_string();
    let combined_b = format!("{} {}", intersection, only_b).trim().to_string();

    let best = [
        ratio(&intersection, &combined_a),
        ratio(&intersection, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .fold(0.0, f64::max);

    (best * 100.0).round()
}

fn process(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    indel::normalized_similarity(a.chars(), b.chars())
}

/// The first hit with the highest raw score.
pub fn select_anchor(hits: &[SearchHit]) -> Option<&SearchHit> {
    hits.iter().fold(None, |best: Option<&SearchHit>, hit| match best {
        Some(current) if hit.raw_score <= current.raw_score => Some(current),
        _ => Some(hit),
    })
}

/// Compute a similarity for every hit, in input order.
///
/// # Errors
///
/// - [`TmError::NoResults`] if `hits` is empty.
/// - [`TmError::InvalidScore`] if the maximum raw score is not a positive number.
pub fn score_hits(query: &str, hits: &[SearchHit]) -> Result<Vec<f64>> {
    let anchor = select_anchor(hits).ok_or(TmError::NoResults)?;
    let max_score = anchor.raw_score;
    if !max_score.is_finite() || max_score <= 0.0 {
        return Err(TmError::InvalidScore(max_score));
    }

    let anchor_similarity = token_set_ratio(&anchor.source_text, query);
    Ok(scale_scores(anchor_similarity, max_score, hits))
}

/// Scale raw scores against the anchor. `max_score` must be positive.
pub fn scale_scores(anchor_similarity: f64, max_score: f64, hits: &[SearchHit]) -> Vec<f64> {
    hits.iter()
        .map(|hit| round2(anchor_similarity * hit.raw_score.max(0.0) / max_score))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(score: f64, source: &str) -> SearchHit {
        SearchHit {
            raw_score: score,
            source_text: source.to_string(),
            target_text: format!("target of {}", source),
            result_type: "translations".to_string(),
        }
    }

    #[test]
    fn test_token_set_ratio_identical_and_reordered() {
        assert_eq!(token_set_ratio("Hello world", "Hello world"), 100.0);
        assert_eq!(
            token_set_ratio("fuzzy wuzzy was a bear", "wuzzy fuzzy was a bear"),
            100.0
        );
        assert_eq!(token_set_ratio("Save file!", "save, FILE"), 100.0);
    }

    #[test]
    fn test_token_set_ratio_subset_scores_full() {
        assert_eq!(
            token_set_ratio("new york mets", "new york mets vs atlanta braves"),
            100.0
        );
    }

    #[test]
    fn test_token_set_ratio_disjoint_and_empty() {
        assert_eq!(token_set_ratio("abc", "xyz"), 0.0);
        assert_eq!(token_set_ratio("", "anything"), 0.0);
        assert_eq!(token_set_ratio("!!!", "anything"), 0.0);
    }

    #[test]
    fn test_token_set_ratio_partial_overlap_is_bounded() {
        let score = token_set_ratio("Open the file", "Close the window");
        assert!(score > 0.0 && score < 100.0, "score was {}", score);
    }

    #[test]
    fn test_token_set_ratio_non_ascii() {
        assert_eq!(token_set_ratio("Größe ändern", "ändern Größe"), 100.0);
        assert_eq!(token_set_ratio("文件 保存", "保存 文件"), 100.0);
    }

    #[test]
    fn test_non_ascii_only_text_keeps_its_tokens() {
        // Stripping non-ASCII would leave no tokens and score 0.
        assert_eq!(token_set_ratio("文件", "文件"), 100.0);
        assert_eq!(token_set_ratio("Größe", "Große"), 80.0);
    }

    #[test]
    fn test_scale_scores_example() {
        let hits = vec![hit(10.0, "a"), hit(8.0, "b"), hit(5.0, "c")];
        assert_eq!(scale_scores(90.0, 10.0, &hits), vec![90.0, 72.0, 45.0]);
    }

    #[test]
    fn test_score_hits_anchors_on_max() {
        let hits = vec![
            hit(10.0, "Save the file"),
            hit(8.0, "Save file as"),
            hit(5.0, "Remove file"),
        ];
        let scores = score_hits("Save the file", &hits).unwrap();
        assert_eq!(scores, vec![100.0, 80.0, 50.0]);
    }

    #[test]
    fn test_score_hits_rounds_to_two_decimals() {
        let hits = vec![hit(3.0, "same text"), hit(1.0, "other")];
        let scores = score_hits("same text", &hits).unwrap();
        assert_eq!(scores, vec![100.0, 33.33]);
    }

    #[test]
    fn test_empty_hits_rejected() {
        let err = score_hits("anything", &[]).unwrap_err();
        assert!(matches!(err, TmError::NoResults));
    }

    #[test]
    fn test_zero_max_score_rejected() {
        let hits = vec![hit(0.0, "a"), hit(0.0, "b")];
        assert!(matches!(
            score_hits("a", &hits).unwrap_err(),
            TmError::InvalidScore(_)
        ));
    }

    #[test]
    fn test_anchor_tie_break_is_first_hit() {
        let hits = vec![hit(2.0, "low"), hit(7.5, "first max"), hit(7.5, "second max")];
        let anchor = select_anchor(&hits).unwrap();
        assert_eq!(anchor.source_text, "first max");

        // The anchor's text drives the measured similarity.
        let scores = score_hits("first max", &hits).unwrap();
        assert_eq!(scores[1], 100.0);
        assert_eq!(scores[2], 100.0);
    }

    #[test]
    fn test_max_hit_need_not_be_first() {
        let hits = vec![hit(4.0, "other words"), hit(8.0, "exact query")];
        let scores = score_hits("exact query", &hits).unwrap();
        assert_eq!(scores, vec![50.0, 100.0]);
    }

    #[test]
    fn test_scores_monotonic_in_raw_score() {
        let raw = [12.5, 0.3, 7.0, 7.0, 11.9, 1.25, 3.3333, 12.49];
        let hits: Vec<SearchHit> = raw
            .iter()
            .enumerate()
            .map(|(i, s)| hit(*s, &format!("open file number {}", i)))
            .collect();
        let scores = score_hits("open file", &hits).unwrap();
        for (i, a) in hits.iter().enumerate() {
            assert!(scores[i] >= 0.0);
            for (j, b) in hits.iter().enumerate() {
                if a.raw_score >= b.raw_score {
                    assert!(
                        scores[i] >= scores[j],
                        "raw {} >= {} but similarity {} < {}",
                        a.raw_score,
                        b.raw_score,
                        scores[i],
                        scores[j]
                    );
                }
            }
        }
    }

    #[test]
    fn test_negative_scores_clamped() {
        let hits = vec![hit(4.0, "a"), hit(-1.0, "b")];
        assert_eq!(scale_scores(50.0, 4.0, &hits), vec![50.0, 0.0]);
    }
}
