//! Readability scoring for extracted text
//!
//! Computes the Flesch reading-ease score and the Flesch–Kincaid grade
//! level. Short labels (ten words or fewer) are not scored. A word is any
//! whitespace-separated token, so "20" and "%" count toward the threshold
//! and add no syllables.

use crate::state::round2;

/// Texts with this many words or fewer are not scored
pub const MIN_WORDS: usize = 10;

/// Reading-ease and grade-level estimates for one text value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadabilityScore {
    pub reading_ease: f64,
    pub grade_level: f64,
}

/// Scores a text value
///
/// Returns None for short texts and for degenerate input that would not
/// produce finite numbers.
///
/// # Examples
///
/// ```
/// use content_audit::readability::score;
///
/// assert!(score("Shop the new collection").is_none());
/// ```
pub fn score(text: &str) -> Option<ReadabilityScore> {
    let words = words(text);
    if words.len() <= MIN_WORDS {
        return None;
    }

    let word_count = words.len() as f64;
    let sentence_count = count_sentences(text) as f64;
    let syllable_count: usize = words.iter().map(|w| count_syllables(w)).sum();
    let syllable_count = syllable_count as f64;

    let words_per_sentence = word_count / sentence_count;
    let syllables_per_word = syllable_count / word_count;

    let reading_ease = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    let grade_level = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;

    if !reading_ease.is_finite() || !grade_level.is_finite() {
        return None;
    }

    Some(ReadabilityScore {
        reading_ease: round2(reading_ease),
        grade_level: round2(grade_level),
    })
}

/// Number of words as counted for the scoring threshold
pub fn word_count(text: &str) -> usize {
    words(text).len()
}

/// Whitespace-separated tokens, letterless ones included
fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Counts sentence terminators (runs of `.`, `!`, `?`), at least one
fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut in_terminator = false;

    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if !in_terminator {
                count += 1;
                in_terminator = true;
            }
        } else if !c.is_whitespace() {
            in_terminator = false;
        }
    }

    // Trailing text without a terminator is still a sentence.
    let trailing = text
        .trim_end()
        .chars()
        .last()
        .map(|c| !matches!(c, '.' | '!' | '?'))
        .unwrap_or(false);
    if trailing {
        count += 1;
    }

    count.max(1)
}

/// Vowel-group syllable heuristic with silent-e adjustment
///
/// At least one for any token with a letter, zero otherwise.
fn count_syllables(word: &str) -> usize {
    let word: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if word.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0;
    let mut previous_vowel = false;
    for &c in &word {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }

    let len = word.len();
    if count > 1 && word[len - 1] == 'e' && !(len >= 2 && word[len - 2] == 'l') {
        count -= 1;
    }

    count.max(1)
}
