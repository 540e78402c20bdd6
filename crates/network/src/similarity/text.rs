//! Set similarity and title keyword extraction

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Keywords kept per title
pub const MAX_TITLE_KEYWORDS: usize = 10;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been",
    "in", "on", "at", "to", "for", "of", "with", "by", "from",
    "and", "or", "but", "not", "this", "that", "these", "those",
    "it", "its", "as", "do", "does", "did", "has", "have", "had",
    "can", "could", "will", "would", "should", "may", "might",
    "into", "onto", "over", "under", "between", "through", "than",
    "their", "there", "which", "while", "when", "where", "what",
    "using", "based", "towards", "toward", "via", "study", "analysis",
    "approach", "new", "novel", "effect", "effects", "role",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`; 0 when both sets are empty
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Lower-cased, trimmed, non-empty set of labels
pub fn normalized_set<'a>(items: impl IntoIterator<Item = &'a String>) -> HashSet<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Up to [`MAX_TITLE_KEYWORDS`] title keywords.
///
/// Words are maximal runs of alphanumeric characters in any script. Words
/// longer than three characters that are not stop words are ranked by
/// frequency and then by first appearance.
pub fn title_keywords(title: &str) -> Vec<String> {
    let lowered = title.to_lowercase();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    let words = lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty());
    for (position, word) in words.enumerate() {
        if word.chars().count() <= 3 || is_stop_word(word) {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.1 .1.cmp(&b.1 .1)));

    ranked
        .into_iter()
        .take(MAX_TITLE_KEYWORDS)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Lower-cased last whitespace token of an author name
pub fn last_name(full_name: &str) -> Option<String> {
    full_name
        .split_whitespace()
        .last()
        .map(|s| s.trim_matches(|c: char| c == ',' || c == '.').to_lowercase())
        .filter(|s| !s.is_empty())
}
