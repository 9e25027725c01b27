//! Entity Resolution
//!
//! Maps free-text tokens onto canonical state, crop and district names from the
//! dataset. Lookup runs in two stages: an exact case-insensitive match on the
//! normalized text, then a containment fallback (the known value contains the
//! token, or the token contains the known value as whole words). Containment
//! ties go to the shortest known value, then alphabetical order.

use std::collections::HashSet;

use crate::dataset::KnownValueSets;

/// Words that carry query meaning and never name an entity on their own.
const QUERY_WORDS: &[&str] = &[
    "about", "across", "against", "analyse", "analyze", "annual", "average", "best", "between",
    "biggest", "compare", "compared", "comparing", "comparison", "crop", "crops", "data",
    "decade", "district", "districts", "does", "during", "from", "give", "grew", "grow",
    "grown", "growth", "have", "highest", "india", "indian", "largest", "last", "leading",
    "least", "list", "lowest", "many", "maximum", "minimum", "most", "much", "over", "past",
    "period", "previous", "produce", "produced", "producing", "production", "rain",
    "rainfall", "rains", "recent", "show", "smallest", "state", "states", "tell",
    "temperature", "that", "this", "time", "tonnes", "total", "trend", "trends", "versus",
    "what", "which", "with", "year", "years",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    State,
    Crop,
    District,
}

pub struct EntityResolver<'a> {
    known: &'a KnownValueSets,
    min_fuzzy_len: usize,
}

impl<'a> EntityResolver<'a> {
    pub fn new(known: &'a KnownValueSets) -> Self {
        Self {
            known,
            min_fuzzy_len: 3,
        }
    }

    /// Shortest token allowed to take part in containment matching.
    pub fn with_min_fuzzy_len(mut self, min_fuzzy_len: usize) -> Self {
        self.min_fuzzy_len = min_fuzzy_len.max(1);
        self
    }

    pub fn resolve_state(&self, text: &str) -> Option<String> {
        self.resolve(EntityKind::State, text)
    }

    pub fn resolve_crop(&self, text: &str) -> Option<String> {
        self.resolve(EntityKind::Crop, text)
    }

    pub fn resolve_district(&self, text: &str) -> Option<String> {
        self.resolve(EntityKind::District, text)
    }

    /// Resolve one token to a canonical value. `None` is a normal outcome.
    pub fn resolve(&self, kind: EntityKind, text: &str) -> Option<String> {
        let token = normalize(text);
        if token.is_empty() {
            return None;
        }
        let values = self.values(kind);

        if let Some(exact) = values.iter().find(|v| normalize(v) == token) {
            return Some(exact.clone());
        }

        if token.chars().count() < self.min_fuzzy_len {
            return None;
        }

        values
            .iter()
            .filter(|v| {
                let known = normalize(v);
                known.contains(&token) || contains_words(&token, &known)
            })
            .min_by(|a, b| {
                a.chars()
                    .count()
                    .cmp(&b.chars().count())
                    .then_with(|| a.cmp(b))
            })
            .cloned()
    }

    pub fn find_states(&self, question: &str) -> Vec<String> {
        self.find(EntityKind::State, question)
    }

    pub fn find_crops(&self, question: &str) -> Vec<String> {
        self.find(EntityKind::Crop, question)
    }

    pub fn find_districts(&self, question: &str) -> Vec<String> {
        self.find(EntityKind::District, question)
    }

    /// Every distinct value of `kind` mentioned in a sentence, in order of appearance.
    ///
    /// Whole-word mentions of known names are taken first. For states and
    /// crops, remaining words that are long enough and not query vocabulary may
    /// still match as the start of a word in a known name ("tamil", "sugar").
    /// Districts are an optional filter and only match as whole words. Words
    /// already covered by a mention of any entity kind are skipped.
    pub fn find(&self, kind: EntityKind, question: &str) -> Vec<String> {
        let normalized = normalize(question);
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

        let mut covered = HashSet::new();
        for other in [EntityKind::State, EntityKind::Crop, EntityKind::District] {
            for m in phrase_matches(self.values(other), &words) {
                covered.extend(m.start..m.start + m.len);
            }
        }

        let mut hits: Vec<(usize, String)> = phrase_matches(self.values(kind), &words)
            .into_iter()
            .map(|m| (m.start, m.value.to_string()))
            .collect();

        if kind != EntityKind::District {
            let min_len = self.min_fuzzy_len.max(4);
            for (idx, word) in words.iter().enumerate() {
                if covered.contains(&idx)
                    || word.chars().count() < min_len
                    || word.chars().all(|c| c.is_ascii_digit())
                    || QUERY_WORDS.contains(word)
                {
                    continue;
                }
                if let Some(value) = self.complete_word(kind, word) {
                    hits.push((idx, value));
                }
            }
        }

        hits.sort_by_key(|(idx, _)| *idx);
        let mut seen = HashSet::new();
        hits.into_iter()
            .filter(|(_, v)| seen.insert(v.clone()))
            .map(|(_, v)| v)
            .collect()
    }

    /// Known value with a word that starts with `token`, shortest then alphabetical.
    fn complete_word(&self, kind: EntityKind, token: &str) -> Option<String> {
        self.values(kind)
            .iter()
            .filter(|v| normalize(v).split(' ').any(|w| w.starts_with(token)))
            .min_by(|a, b| {
                a.chars()
                    .count()
                    .cmp(&b.chars().count())
                    .then_with(|| a.cmp(b))
            })
            .cloned()
    }

    fn values(&self, kind: EntityKind) -> &'a [String] {
        match kind {
            EntityKind::State => &self.known.states,
            EntityKind::Crop => &self.known.crops,
            EntityKind::District => &self.known.districts,
        }
    }
}

struct PhraseMatch<'v> {
    start: usize,
    len: usize,
    value: &'v str,
}

/// Non-overlapping whole-word occurrences of `values` in `words`.
/// At a shared start position the longer name wins.
fn phrase_matches<'v>(values: &'v [String], words: &[&str]) -> Vec<PhraseMatch<'v>> {
    let mut found = Vec::new();
    for value in values {
        let normalized = normalize(value);
        let needle: Vec<&str> = normalized.split(' ').collect();
        if needle.is_empty() || needle.len() > words.len() {
            continue;
        }
        if let Some(start) = words.windows(needle.len()).position(|w| w == needle.as_slice()) {
            found.push(PhraseMatch {
                start,
                len: needle.len(),
                value: value.as_str(),
            });
        }
    }

    found.sort_by(|a, b| a.start.cmp(&b.start).then(b.len.cmp(&a.len)));
    let mut next_free = 0;
    found
        .into_iter()
        .filter(|m| {
            if m.start < next_free {
                return false;
            }
            next_free = m.start + m.len;
            true
        })
        .collect()
}

/// Lowercase, turn punctuation into spaces, collapse whitespace.
pub(crate) fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}
