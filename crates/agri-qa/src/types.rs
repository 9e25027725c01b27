use serde::{Deserialize, Serialize};
use std::fmt;

/// Annual climate observation for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    pub state: String,
    pub year: i32,
    pub rainfall_mm: f64,
    pub avg_temperature_c: f64,
}

/// Annual production of one crop in one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    pub state: String,
    pub district: String,
    pub crop: String,
    pub year: i32,
    pub production_tonnes: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RainfallComparison,
    TopCropsByProduction,
    TopDistrictByCropProduction,
    CropProductionTrend,
    #[default]
    Unknown,
}

impl Intent {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RainfallComparison => "Rainfall Comparison",
            Self::TopCropsByProduction => "Top Crops by Production",
            Self::TopDistrictByCropProduction => "District Production Ranking",
            Self::CropProductionTrend => "Crop Production Trend",
            Self::Unknown => "Unknown",
        }
    }

    /// Publishers of the statistics behind answers of this kind.
    pub fn sources(&self) -> &'static [&'static str] {
        match self {
            Self::RainfallComparison => &[
                "India Meteorological Department - Rainfall Statistics",
                "data.gov.in/rainfall_india",
            ],
            Self::TopCropsByProduction => &[
                "Ministry of Agriculture & Farmers Welfare - Crop Production Statistics",
                "data.gov.in/agricultural_statistics",
            ],
            Self::TopDistrictByCropProduction => &[
                "Ministry of Agriculture - District-wise Production Data",
                "data.gov.in/district_agriculture_data",
            ],
            Self::CropProductionTrend => &[
                "Ministry of Agriculture - Historical Production Data",
                "IMD - Climate Data",
                "data.gov.in/crop_statistics_timeseries",
            ],
            Self::Unknown => &[],
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which end of a district ranking the question asks about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ranking {
    #[default]
    Highest,
    Lowest,
}

impl Ranking {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::Lowest => "lowest",
        }
    }
}

/// A required parameter the question did not supply in a recognizable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingField {
    State,
    Crop,
}

impl MissingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Crop => "crop",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured parameters pulled out of one question.
///
/// Entity fields only ever hold canonical values from the dataset. Anything the
/// intent requires but the question did not resolve is listed in `missing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub intent: Intent,
    pub states: Vec<String>,
    pub crop: Option<String>,
    pub district: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub top_n: Option<usize>,
    #[serde(default)]
    pub ranking: Ranking,
    #[serde(default)]
    pub missing: Vec<MissingField>,
}

impl ParsedQuery {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn mark_missing(&mut self, field: MissingField) {
        if !self.missing.contains(&field) {
            self.missing.push(field);
            self.missing.sort();
        }
    }

    /// Inclusive year bounds, when the question named any.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        match (self.year_from, self.year_to) {
            (Some(from), Some(to)) => Some((from, to)),
            (Some(from), None) => Some((from, from)),
            (None, Some(to)) => Some((to, to)),
            (None, None) => None,
        }
    }
}

/// How a request ended. Every request maps to exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Answered,
    NoData,
    Incomplete { missing: Vec<MissingField> },
    NotUnderstood,
}

/// One table row; column order is preserved for display.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub summary_text: String,
    pub table_rows: Vec<Row>,
    pub intent: Intent,
    pub outcome: Outcome,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl AnswerResult {
    pub fn answered(intent: Intent, summary_text: String, table_rows: Vec<Row>) -> Self {
        Self {
            summary_text,
            table_rows,
            intent,
            outcome: Outcome::Answered,
            sources: intent.sources().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn no_data(intent: Intent, parameters: &str) -> Self {
        Self {
            summary_text: format!("No data found for {}.", parameters),
            table_rows: Vec::new(),
            intent,
            outcome: Outcome::NoData,
            sources: Vec::new(),
        }
    }

    pub fn incomplete(intent: Intent, missing: Vec<MissingField>, summary_text: String) -> Self {
        Self {
            summary_text,
            table_rows: Vec::new(),
            intent,
            outcome: Outcome::Incomplete { missing },
            sources: Vec::new(),
        }
    }

    pub fn not_understood() -> Self {
        Self {
            summary_text: "I couldn't understand your question.".to_string(),
            table_rows: Vec::new(),
            intent: Intent::Unknown,
            outcome: Outcome::NotUnderstood,
            sources: Vec::new(),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.outcome == Outcome::Answered
    }
}
