use battle_types::{Bonus, BonusKind, DifficultyMetadata, DifficultyTier, ScoreResult};
use std::collections::HashSet;

use crate::lexicon::{DESCRIPTIVE_ADJECTIVES, SEMANTIC_CATEGORIES, TECHNICAL_TERMS};

// Scoring constants. Accuracy is built from a 60-point word-match core
// plus capped bonuses and penalties, then clamped to 0..=100.
const WORD_MATCH_WEIGHT: f64 = 60.0;
const EXTRA_WORD_PENALTY: f64 = 1.5;
const EXTRA_PENALTY_CAP: f64 = 15.0;
const SUBSTRING_FLOOR: f64 = 90.0;
const CATEGORY_BONUS_CAP: f64 = 10.0;
const ORDER_BONUS_PER_PAIR: f64 = 3.0;
const ORDER_BONUS_CAP: f64 = 15.0;
const NO_OVERLAP_PENALTY: f64 = 20.0;

/// Word-level comparison of a target prompt and an attempt. All lists
/// are unique words in first-occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub struct WordOverlap {
    pub matched: Vec<String>,
    pub missed: Vec<String>,
    pub extra: Vec<String>,
    pub target_count: usize,
    pub attempt_count: usize,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Lowercase, map punctuation to spaces, collapse whitespace, trim.
    /// Idempotent: normalizing a normalized string is a no-op.
    pub fn normalize(text: &str) -> String {
        let mapped: String = text
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        mapped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Unique words of the normalized text, preserving first-occurrence
    /// order.
    pub fn extract_words(text: &str) -> Vec<String> {
        let normalized = Self::normalize(text);
        let mut seen = HashSet::new();
        normalized
            .split(' ')
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.to_string()))
            .map(|w| w.to_string())
            .collect()
    }

    pub fn word_overlap(target: &str, attempt: &str) -> WordOverlap {
        let target_words = Self::extract_words(target);
        let attempt_words = Self::extract_words(attempt);

        let attempt_set: HashSet<&String> = attempt_words.iter().collect();
        let target_set: HashSet<&String> = target_words.iter().collect();

        let matched: Vec<String> = target_words
            .iter()
            .filter(|w| attempt_set.contains(w))
            .cloned()
            .collect();
        let missed: Vec<String> = target_words
            .iter()
            .filter(|w| !attempt_set.contains(w))
            .cloned()
            .collect();
        let extra: Vec<String> = attempt_words
            .iter()
            .filter(|w| !target_set.contains(w))
            .cloned()
            .collect();

        WordOverlap {
            target_count: target_words.len(),
            attempt_count: attempt_words.len(),
            matched,
            missed,
            extra,
        }
    }

    /// Score an attempt against the target prompt. Deterministic: the
    /// same inputs always produce the same `ScoreResult`.
    pub fn score(
        target: &str,
        attempt: &str,
        tier: DifficultyTier,
        metadata: &DifficultyMetadata,
    ) -> ScoreResult {
        let target_norm = Self::normalize(target);
        let attempt_norm = Self::normalize(attempt);

        if attempt_norm.is_empty() {
            return ScoreResult {
                accuracy_score: 0,
                leaderboard_points: 0,
                matched_words: Vec::new(),
                missed_words: Self::extract_words(target),
                bonuses: Vec::new(),
                explanation: "Empty prompt submitted".to_string(),
            };
        }

        if target_norm.is_empty() {
            // A target with no words cannot be scored against; every
            // attempt gets zero rather than dividing by nothing.
            return ScoreResult {
                accuracy_score: 0,
                leaderboard_points: 0,
                matched_words: Vec::new(),
                missed_words: Vec::new(),
                bonuses: Vec::new(),
                explanation: "The original prompt had no scorable words".to_string(),
            };
        }

        let overlap = Self::word_overlap(target, attempt);
        let accuracy = Self::accuracy_score(&target_norm, &attempt_norm, &overlap);
        let bonuses = Self::collect_bonuses(&overlap);
        let bonus_total: i32 = bonuses.iter().map(|b| b.points).sum();

        let leaderboard_points =
            ((accuracy + bonus_total) as f64 * tier.multiplier()).round() as i32;

        let explanation = Self::explanation(accuracy, &overlap, metadata);

        ScoreResult {
            accuracy_score: accuracy,
            leaderboard_points,
            matched_words: overlap.matched,
            missed_words: overlap.missed,
            bonuses,
            explanation,
        }
    }

    /// The 0-100 similarity score, before bonuses and the difficulty
    /// multiplier. Inputs must already be normalized.
    fn accuracy_score(target_norm: &str, attempt_norm: &str, overlap: &WordOverlap) -> i32 {
        let mut score: f64 = 0.0;

        if overlap.target_count > 0 {
            let word_match =
                overlap.matched.len() as f64 / overlap.target_count as f64 * WORD_MATCH_WEIGHT;
            let extra_penalty =
                (overlap.extra.len() as f64 * EXTRA_WORD_PENALTY).min(EXTRA_PENALTY_CAP);
            let length_bonus = Self::length_bonus(overlap.attempt_count, overlap.target_count);

            score = (word_match - extra_penalty + length_bonus).max(0.0);
        }

        if target_norm == attempt_norm {
            score = 100.0;
        } else if attempt_norm.contains(target_norm) || target_norm.contains(attempt_norm) {
            score = score.max(SUBSTRING_FLOOR);
        }

        score += Self::category_bonus(target_norm, attempt_norm);
        score += Self::order_bonus(target_norm, attempt_norm);

        if overlap.matched.is_empty() && overlap.target_count > 3 {
            score = (score - NO_OVERLAP_PENALTY).max(0.0);
        }

        score.clamp(0.0, 100.0).round() as i32
    }

    fn length_bonus(attempt_count: usize, target_count: usize) -> f64 {
        if attempt_count == 0 || target_count == 0 {
            return 0.0;
        }
        let ratio =
            attempt_count.min(target_count) as f64 / attempt_count.max(target_count) as f64;
        if ratio >= 0.8 {
            10.0
        } else if ratio >= 0.6 {
            5.0
        } else {
            0.0
        }
    }

    /// For each semantic category both prompts touch, award a share of 5
    /// points proportional to coverage, capped at 10 per category.
    fn category_bonus(target_norm: &str, attempt_norm: &str) -> f64 {
        let target_words: HashSet<&str> = target_norm.split(' ').collect();
        let attempt_words: HashSet<&str> = attempt_norm.split(' ').collect();

        let mut bonus = 0.0;
        for (_, keywords) in SEMANTIC_CATEGORIES {
            let target_hits = keywords.iter().filter(|k| target_words.contains(**k)).count();
            let attempt_hits = keywords
                .iter()
                .filter(|k| attempt_words.contains(**k))
                .count();

            if target_hits > 0 && attempt_hits > 0 {
                let category_score = attempt_hits as f64 / target_hits as f64 * 5.0;
                bonus += category_score.min(CATEGORY_BONUS_CAP);
            }
        }
        bonus
    }

    /// Reward preserved word order: the longest run of consecutive target
    /// word pairs that also appear adjacent, in order, in the attempt.
    fn order_bonus(target_norm: &str, attempt_norm: &str) -> f64 {
        let target_seq: Vec<&str> = target_norm.split(' ').filter(|w| !w.is_empty()).collect();
        let attempt_seq: Vec<&str> = attempt_norm.split(' ').filter(|w| !w.is_empty()).collect();

        if target_seq.len() < 2 || attempt_seq.len() < 2 {
            return 0.0;
        }

        let position_of = |word: &str| attempt_seq.iter().position(|w| *w == word);

        let mut consecutive = 0u32;
        let mut longest = 0u32;
        for pair in target_seq.windows(2) {
            let adjacent = match (position_of(pair[0]), position_of(pair[1])) {
                (Some(i), Some(j)) => j == i + 1,
                _ => false,
            };
            if adjacent {
                consecutive += 1;
                longest = longest.max(consecutive);
            } else {
                consecutive = 0;
            }
        }

        (longest as f64 * ORDER_BONUS_PER_PAIR).min(ORDER_BONUS_CAP)
    }

    /// Bonuses are additive to the accuracy score before the difficulty
    /// multiplier; each is independently testable.
    fn collect_bonuses(overlap: &WordOverlap) -> Vec<Bonus> {
        let mut bonuses = Vec::new();

        if overlap.target_count > 0 {
            let matched_ratio = overlap.matched.len() as f64 / overlap.target_count as f64;
            let length_ratio = overlap.attempt_count as f64 / overlap.target_count as f64;

            if length_ratio <= 0.8 && matched_ratio >= 0.7 {
                bonuses.push(Bonus {
                    kind: BonusKind::Conciseness,
                    points: 5,
                    detail: format!(
                        "Captured {} of {} words with a shorter prompt",
                        overlap.matched.len(),
                        overlap.target_count
                    ),
                });
            }
        }

        let attempt_set: HashSet<&str> = overlap
            .matched
            .iter()
            .chain(overlap.extra.iter())
            .map(|w| w.as_str())
            .collect();

        if overlap.matched.len() >= 3 {
            let adjective = DESCRIPTIVE_ADJECTIVES
                .iter()
                .find(|a| attempt_set.contains(**a));
            if let Some(adjective) = adjective {
                bonuses.push(Bonus {
                    kind: BonusKind::Creativity,
                    points: 3,
                    detail: format!("Descriptive wording ('{adjective}')"),
                });
            }
        }

        let matched_set: HashSet<&str> = overlap.matched.iter().map(|w| w.as_str()).collect();
        for term in TECHNICAL_TERMS {
            if matched_set.contains(*term) {
                bonuses.push(Bonus {
                    kind: BonusKind::TechnicalTerm,
                    points: 2,
                    detail: format!("Shared technical term '{term}'"),
                });
            }
        }

        if overlap.target_count > 0
            && overlap.matched.len() == overlap.target_count
            && overlap.extra.is_empty()
        {
            bonuses.push(Bonus {
                kind: BonusKind::PerfectMatch,
                points: 10,
                detail: "Every target word matched with nothing extra".to_string(),
            });
        }

        bonuses
    }

    fn explanation(score: i32, overlap: &WordOverlap, metadata: &DifficultyMetadata) -> String {
        let mut text = format!(
            "You matched {} of {} key words from the original prompt. ",
            overlap.matched.len(),
            overlap.target_count
        );

        text.push_str(if score >= 90 {
            "Excellent! You captured almost everything important."
        } else if score >= 80 {
            "Great job! You got most of the key concepts and details."
        } else if score >= 70 {
            "Good attempt! You captured the main elements well."
        } else if score >= 60 {
            "Not bad! You got some key words but missed others."
        } else if score >= 40 {
            "Decent effort, but you missed several important elements."
        } else if score >= 20 {
            "Try to focus on the main subjects, actions, and visual details."
        } else {
            "This doesn't seem to match the image well. Look more carefully at what you see."
        });

        if !overlap.missed.is_empty() {
            let shown: Vec<&str> = overlap.missed.iter().take(5).map(|w| w.as_str()).collect();
            text.push_str(&format!(" Missed words: {}", shown.join(", ")));
            if overlap.missed.len() > 5 {
                text.push_str(&format!(" and {} more", overlap.missed.len() - 5));
            }
            text.push('.');
        }

        if !overlap.matched.is_empty() {
            let shown: Vec<&str> = overlap.matched.iter().take(5).map(|w| w.as_str()).collect();
            text.push_str(&format!(" You correctly included: {}.", shown.join(", ")));
        }

        if !overlap.extra.is_empty() {
            text.push_str(&format!(
                " Your prompt had {} words not in the original.",
                overlap.extra.len()
            ));
        }

        if score < 50 && metadata.is_verbose {
            text.push_str(
                " The original prompt is long; concentrate on the main subjects and the art style.",
            );
        }

        text
    }
}
