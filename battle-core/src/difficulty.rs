use battle_types::{DifficultyMetadata, DifficultyTier};

use crate::lexicon::{
    ABSTRACT_EASY, ABSTRACT_HARD, ABSTRACT_MEDIUM, ART_STYLES_EASY, ART_STYLES_HARD,
    ART_STYLES_MEDIUM, COMPLEXITY_EASY, COMPLEXITY_HARD, COMPLEXITY_MEDIUM, KNOWN_NAMES,
};
use crate::scoring::ScoringEngine;

// Weighted contribution of each factor to the overall difficulty score.
const WEIGHT_WORD_COUNT: f64 = 0.3;
const WEIGHT_COMPLEXITY: f64 = 0.25;
const WEIGHT_NAMED_ENTITIES: f64 = 0.2;
const WEIGHT_ART_STYLES: f64 = 0.15;
const WEIGHT_ABSTRACT: f64 = 0.1;

const EASY_THRESHOLD: f64 = 1.8;
const MEDIUM_THRESHOLD: f64 = 2.3;

/// Classify a target prompt into a difficulty tier and the metadata the
/// scoring layer carries along. This runs once per corpus entry at
/// dataset load, not during rounds.
pub fn analyze(prompt: &str) -> (DifficultyTier, DifficultyMetadata) {
    let words: Vec<String> = ScoringEngine::normalize(prompt)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect();
    let word_count = words.len();

    let word_count_score = if word_count <= 8 {
        1
    } else if word_count <= 15 {
        2
    } else {
        3
    };
    let complexity_score = complexity_keywords_score(&words);
    let named_entities = count_named_entities(prompt);
    let entity_score = if named_entities == 0 {
        1
    } else if named_entities <= 2 {
        2
    } else {
        3
    };
    let art_style_score = banded_score(&words, ART_STYLES_EASY, ART_STYLES_MEDIUM, ART_STYLES_HARD);
    let abstract_score = banded_score(&words, ABSTRACT_EASY, ABSTRACT_MEDIUM, ABSTRACT_HARD);

    let total = word_count_score as f64 * WEIGHT_WORD_COUNT
        + complexity_score as f64 * WEIGHT_COMPLEXITY
        + entity_score as f64 * WEIGHT_NAMED_ENTITIES
        + art_style_score as f64 * WEIGHT_ART_STYLES
        + abstract_score as f64 * WEIGHT_ABSTRACT;

    let mut tier = if total <= EASY_THRESHOLD {
        DifficultyTier::Easy
    } else if total <= MEDIUM_THRESHOLD {
        DifficultyTier::Medium
    } else {
        DifficultyTier::Hard
    };

    // Promotion heuristics: several complex factors or sheer verbosity
    // push a prompt up one tier for a better corpus distribution.
    let factor_scores = [
        word_count_score,
        complexity_score,
        entity_score,
        art_style_score,
        abstract_score,
    ];
    let complex_factors = factor_scores.iter().filter(|s| **s >= 2).count();
    let has_multiple_complex = complex_factors >= 2;
    let very_verbose = word_count >= 20;
    let specific_art_style = art_style_score >= 3;

    if tier == DifficultyTier::Medium && (has_multiple_complex || very_verbose) {
        tier = DifficultyTier::Hard;
    } else if tier == DifficultyTier::Easy
        && (has_multiple_complex || specific_art_style || word_count >= 15)
    {
        tier = DifficultyTier::Medium;
    }

    let metadata = DifficultyMetadata {
        word_count,
        named_entities,
        has_complex_keywords: complexity_score >= 2,
        has_art_style: art_style_score >= 2,
        has_abstract_concepts: abstract_score >= 2,
        is_verbose: word_count_score >= 2,
    };

    (tier, metadata)
}

/// Score 1-3 from whichever complexity band has the most keyword hits.
fn complexity_keywords_score(words: &[String]) -> u8 {
    let count_in = |band: &[&str]| words.iter().filter(|w| band.contains(&w.as_str())).count();
    let easy = count_in(COMPLEXITY_EASY);
    let medium = count_in(COMPLEXITY_MEDIUM);
    let hard = count_in(COMPLEXITY_HARD);

    if hard > medium && hard > easy {
        3
    } else if medium > easy {
        2
    } else {
        1
    }
}

/// Score 1-3 from the hardest band any word falls into.
fn banded_score(words: &[String], easy: &[&str], medium: &[&str], hard: &[&str]) -> u8 {
    let mut score = 1;
    for word in words {
        if hard.contains(&word.as_str()) {
            score = score.max(3);
        } else if medium.contains(&word.as_str()) {
            score = score.max(2);
        } else if easy.contains(&word.as_str()) {
            score = score.max(1);
        }
    }
    score
}

/// Capitalized words (beyond length 1) and known corpus names count as
/// named entities. Heuristic, not NLP.
fn count_named_entities(prompt: &str) -> usize {
    prompt
        .split_whitespace()
        .filter(|word| {
            let capitalized = word.len() > 1
                && word.chars().next().is_some_and(|c| c.is_uppercase());
            let known = KNOWN_NAMES
                .iter()
                .any(|name| word.to_lowercase().contains(name));
            capitalized || known
        })
        .count()
}
