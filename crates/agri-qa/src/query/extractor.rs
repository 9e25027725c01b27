//! Parameter Extraction
//!
//! Pulls the entities and numeric arguments an intent needs out of the question
//! text. Entities go through the resolver, so anything placed in a
//! `ParsedQuery` is a canonical dataset value. Required entities that do not
//! resolve are recorded as missing rather than defaulted.

use std::sync::LazyLock;

use super::resolver::EntityResolver;
use crate::config::QueryConfig;
use crate::dataset::KnownValueSets;
use crate::types::{Intent, MissingField, ParsedQuery, Ranking};

static YEAR_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\b(?:19|20)\d{2}\b").expect("year regex is valid")
});
static RELATIVE_YEARS_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"\b(?:last|past|previous|recent|over)\s+(\d{1,3}|[a-z]+)\s+years?\b",
    )
    .expect("relative years regex is valid")
});
static DECADE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\b(?:last|past|previous)\s+decade\b").expect("decade regex is valid")
});
static TOP_COUNT_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\btop\s+(\d{1,3}|[a-z]+)\b").expect("top count regex is valid")
});

const LOWEST_WORDS: &[&str] = &["lowest", "least", "minimum", "min", "smallest"];

pub struct ParameterExtractor<'a> {
    resolver: EntityResolver<'a>,
    known: &'a KnownValueSets,
    default_top_n: usize,
    max_top_n: usize,
}

impl<'a> ParameterExtractor<'a> {
    pub fn new(known: &'a KnownValueSets, config: &QueryConfig) -> Self {
        Self {
            resolver: EntityResolver::new(known).with_min_fuzzy_len(config.min_fuzzy_len),
            known,
            default_top_n: config.default_top_n.max(1),
            max_top_n: config.max_top_n.max(1),
        }
    }

    pub fn extract(&self, question: &str, intent: Intent) -> ParsedQuery {
        let lower = question.to_lowercase();
        let mut query = ParsedQuery::new(intent);

        match intent {
            Intent::RainfallComparison => {
                query.states = self.resolver.find_states(question).into_iter().take(2).collect();
                if query.states.len() < 2 {
                    query.mark_missing(MissingField::State);
                }
                self.apply_year_range(&lower, &mut query);
            }
            Intent::TopCropsByProduction => {
                self.require_state(question, &mut query);
                query.top_n = Some(self.top_n(&lower));
                self.apply_year_range(&lower, &mut query);
            }
            Intent::TopDistrictByCropProduction => {
                self.require_state(question, &mut query);
                self.require_crop(question, &mut query);
                query.ranking = ranking(&lower);
                self.apply_year_range(&lower, &mut query);
            }
            Intent::CropProductionTrend => {
                self.require_crop(question, &mut query);
                query.states = self.resolver.find_states(question).into_iter().take(1).collect();
                query.district = self.resolver.find_districts(question).into_iter().next();
                self.apply_year_range(&lower, &mut query);
            }
            Intent::Unknown => {}
        }

        tracing::debug!(
            intent = ?query.intent,
            states = ?query.states,
            crop = ?query.crop,
            district = ?query.district,
            year_from = ?query.year_from,
            year_to = ?query.year_to,
            top_n = ?query.top_n,
            missing = ?query.missing,
            "Parameters extracted"
        );
        query
    }

    fn require_state(&self, question: &str, query: &mut ParsedQuery) {
        match self.resolver.find_states(question).into_iter().next() {
            Some(state) => query.states = vec![state],
            None => query.mark_missing(MissingField::State),
        }
    }

    fn require_crop(&self, question: &str, query: &mut ParsedQuery) {
        match self.resolver.find_crops(question).into_iter().next() {
            Some(crop) => query.crop = Some(crop),
            None => query.mark_missing(MissingField::Crop),
        }
    }

    fn apply_year_range(&self, lower: &str, query: &mut ParsedQuery) {
        if let Some((from, to)) = self.year_range(lower) {
            query.year_from = Some(from);
            query.year_to = Some(to);
        }
    }

    /// Explicit years win; otherwise "last N years" / "last decade" count back
    /// from the newest year in the dataset.
    pub fn year_range(&self, lower: &str) -> Option<(i32, i32)> {
        let years: Vec<i32> = YEAR_RE
            .find_iter(lower)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        if let (Some(&from), Some(&to)) = (years.iter().min(), years.iter().max()) {
            return Some((from, to));
        }

        let span = RELATIVE_YEARS_RE
            .captures_iter(lower)
            .find_map(|caps| parse_count(&caps[1]))
            .or_else(|| DECADE_RE.is_match(lower).then_some(10))
            .filter(|n| *n > 0)?;

        let to = self.known.max_year;
        let from = to.saturating_sub(i32::try_from(span).ok()?.saturating_sub(1));
        Some((from, to))
    }

    /// Count written right after "top", clamped to `[1, max_top_n]`.
    pub fn top_n(&self, lower: &str) -> usize {
        let requested = TOP_COUNT_RE
            .captures(lower)
            .and_then(|caps| parse_count(&caps[1]));

        match requested {
            Some(n) => {
                let clamped = n.clamp(1, self.max_top_n);
                if clamped != n {
                    tracing::debug!(requested = n, clamped, "Ranking size clamped");
                }
                clamped
            }
            None => self.default_top_n,
        }
    }
}

fn ranking(lower: &str) -> Ranking {
    let lowest = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| LOWEST_WORDS.contains(&w));
    if lowest {
        Ranking::Lowest
    } else {
        Ranking::Highest
    }
}

/// Digits or an English number word up to twenty.
fn parse_count(text: &str) -> Option<usize> {
    if let Ok(n) = text.parse::<usize>() {
        return Some(n);
    }
    let n = match text {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        _ => return None,
    };
    Some(n)
}
