//! Intent Classifier
//!
//! Keyword rules evaluated in a fixed priority order; the first rule whose
//! predicate holds decides the intent. Several keyword sets overlap ("top" shows
//! up in both district and crop rankings), so the order below is part of the
//! contract and is covered by tests.

use std::collections::HashSet;

use super::resolver::normalize;
use crate::dataset::KnownValueSets;
use crate::types::Intent;

const RAINFALL_WORDS: &[&str] = &["rainfall", "rain", "rains", "precipitation", "monsoon"];
const COMPARE_WORDS: &[&str] = &[
    "compare", "compared", "comparing", "comparison", "vs", "versus", "between", "against",
];
const DISTRICT_WORDS: &[&str] = &["district", "districts"];
const RANK_WORDS: &[&str] = &[
    "highest", "top", "most", "largest", "biggest", "maximum", "max", "best", "lowest", "least",
    "minimum", "min", "smallest",
];
const TOP_WORDS: &[&str] = &["top", "leading"];
const TOP_PHRASES: &[&str] = &["most produced", "most grown", "highest producing"];
const CROP_WORDS: &[&str] = &["crop", "crops"];
const TREND_WORDS: &[&str] = &["trend", "trends", "growth", "yoy"];
const TREND_PHRASES: &[&str] = &["over the years", "over time", "year over year", "year on year"];

/// Lexical facts about one question that rule predicates test.
#[derive(Debug)]
pub struct Signals {
    words: HashSet<String>,
    padded: String,
    mentions_crop: bool,
}

impl Signals {
    fn new(question: &str, crop_phrases: &[String]) -> Self {
        let normalized = normalize(question);
        let padded = format!(" {} ", normalized);
        let words = normalized.split(' ').map(str::to_string).collect::<HashSet<_>>();
        let mentions_crop = CROP_WORDS.iter().any(|w| words.contains(*w))
            || crop_phrases
                .iter()
                .any(|c| padded.contains(&format!(" {} ", c)));
        Self {
            words,
            padded,
            mentions_crop,
        }
    }

    pub fn has_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.words.contains(*w))
    }

    pub fn has_phrase(&self, phrases: &[&str]) -> bool {
        phrases
            .iter()
            .any(|p| self.padded.contains(&format!(" {} ", p)))
    }

    pub fn mentions_crop(&self) -> bool {
        self.mentions_crop
    }
}

/// One entry of the prioritized rule list.
#[derive(Clone)]
pub struct IntentRule {
    pub name: &'static str,
    pub intent: Intent,
    predicate: fn(&Signals) -> bool,
}

impl IntentRule {
    pub fn new(name: &'static str, intent: Intent, predicate: fn(&Signals) -> bool) -> Self {
        Self {
            name,
            intent,
            predicate,
        }
    }

    pub fn matches(&self, signals: &Signals) -> bool {
        (self.predicate)(signals)
    }
}

impl std::fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRule")
            .field("name", &self.name)
            .field("intent", &self.intent)
            .finish()
    }
}

/// The built-in rules, highest priority first.
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new("rainfall_comparison", Intent::RainfallComparison, |s| {
            s.has_any(RAINFALL_WORDS) && s.has_any(COMPARE_WORDS)
        }),
        // Before top crops: "top district" questions also say "top"
        IntentRule::new("district_ranking", Intent::TopDistrictByCropProduction, |s| {
            s.has_any(DISTRICT_WORDS) && s.has_any(RANK_WORDS)
        }),
        IntentRule::new("top_crops", Intent::TopCropsByProduction, |s| {
            (s.has_any(TOP_WORDS) || s.has_phrase(TOP_PHRASES)) && s.has_any(CROP_WORDS)
        }),
        IntentRule::new("production_trend", Intent::CropProductionTrend, |s| {
            (s.has_any(TREND_WORDS) || s.has_phrase(TREND_PHRASES)) && s.mentions_crop()
        }),
    ]
}

pub struct IntentClassifier {
    rules: Vec<IntentRule>,
    crop_phrases: Vec<String>,
}

impl IntentClassifier {
    pub fn new(known: &KnownValueSets) -> Self {
        Self::with_rules(known, default_rules())
    }

    pub fn with_rules(known: &KnownValueSets, rules: Vec<IntentRule>) -> Self {
        Self {
            rules,
            crop_phrases: known.crops.iter().map(|c| normalize(c)).collect(),
        }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, question: &str) -> Intent {
        self.matching_rule(question)
            .map_or(Intent::Unknown, |rule| rule.intent)
    }

    /// The first rule that fires for `question`, if any.
    pub fn matching_rule(&self, question: &str) -> Option<&IntentRule> {
        let signals = Signals::new(question, &self.crop_phrases);
        let rule = self.rules.iter().find(|r| r.matches(&signals));
        tracing::debug!(
            question = %question,
            rule = rule.map_or("none", |r| r.name),
            "Intent classified"
        );
        rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        let known = KnownValueSets {
            states: vec!["Maharashtra".to_string(), "Punjab".to_string()],
            crops: vec!["Rice".to_string(), "Wheat".to_string()],
            districts: vec!["Nashik".to_string()],
            min_year: 2019,
            max_year: 2023,
        };
        IntentClassifier::new(&known)
    }

    #[test]
    fn test_rainfall_comparison() {
        let c = classifier();
        assert_eq!(
            c.classify("Compare rainfall in Maharashtra and Punjab for last 4 years"),
            Intent::RainfallComparison
        );
        assert_eq!(c.classify("Punjab vs. Maharashtra rainfall"), Intent::RainfallComparison);
    }

    #[test]
    fn test_rainfall_without_comparison_is_unknown() {
        assert_eq!(classifier().classify("How much rainfall did Punjab get?"), Intent::Unknown);
    }

    #[test]
    fn test_top_crops() {
        let c = classifier();
        assert_eq!(c.classify("Top 3 crops in Maharashtra by production"), Intent::TopCropsByProduction);
        assert_eq!(c.classify("List the most produced crops in Punjab"), Intent::TopCropsByProduction);
    }

    #[test]
    fn test_district_ranking() {
        let c = classifier();
        assert_eq!(
            c.classify("Which district has the highest production of Rice in Maharashtra?"),
            Intent::TopDistrictByCropProduction
        );
        assert_eq!(
            c.classify("Which district has the lowest wheat output in Punjab"),
            Intent::TopDistrictByCropProduction
        );
    }

    #[test]
    fn test_trend_requires_crop_mention() {
        let c = classifier();
        assert_eq!(
            c.classify("Analyze the production trend of Rice in Punjab over the last decade"),
            Intent::CropProductionTrend
        );
        assert_eq!(c.classify("wheat production year-over-year"), Intent::CropProductionTrend);
        assert_eq!(c.classify("What is the trend in Punjab?"), Intent::Unknown);
    }

    #[test]
    fn test_top_and_district_prefers_district() {
        let c = classifier();
        assert_eq!(
            c.classify("Top district for rice crops in Punjab"),
            Intent::TopDistrictByCropProduction
        );
        let rule = c.matching_rule("Top district for rice crops in Punjab").unwrap();
        assert_eq!(rule.name, "district_ranking");
    }

    #[test]
    fn test_rainfall_outranks_everything() {
        assert_eq!(
            classifier().classify("Compare rainfall trend between the top crop districts"),
            Intent::RainfallComparison
        );
    }

    #[test]
    fn test_ranking_outranks_trend() {
        assert_eq!(
            classifier().classify("Top crops by growth trend in Punjab"),
            Intent::TopCropsByProduction
        );
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let names: Vec<&str> = classifier().rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["rainfall_comparison", "district_ranking", "top_crops", "production_trend"]
        );
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        assert_eq!(classifier().classify("laptop cropping brainfall"), Intent::Unknown);
    }

    #[test]
    fn test_gibberish_is_unknown_and_stable() {
        let c = classifier();
        for _ in 0..5 {
            assert_eq!(c.classify("asdkjasd random text"), Intent::Unknown);
        }
        assert_eq!(c.classify(""), Intent::Unknown);
    }

    #[test]
    fn test_custom_rule_list() {
        let known = KnownValueSets {
            states: Vec::new(),
            crops: Vec::new(),
            districts: Vec::new(),
            min_year: 2020,
            max_year: 2020,
        };
        let c = IntentClassifier::with_rules(
            &known,
            vec![IntentRule::new("anything_rainy", Intent::RainfallComparison, |s| {
                s.has_any(RAINFALL_WORDS)
            })],
        );
        assert_eq!(c.classify("rain"), Intent::RainfallComparison);
    }
}
