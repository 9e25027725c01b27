//! Reference data parsing.
//!
//! Reads the JSON document layout:
//!
//! ```json
//! {
//!   "climate": [{"state": "...", "year": 2021, "rainfall_mm": 1200, "avg_temperature_c": 28.0}],
//!   "crops":   [{"state": "...", "district": "...", "crop": "...", "year": 2021, "production_tonnes": 3650}]
//! }
//! ```
//!
//! Numeric fields may be JSON numbers or numeric strings (the data.gov.in
//! exports quote them). Names are whitespace-normalized and folded onto the
//! first spelling seen, so "punjab" and "Punjab" land on one canonical value.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::LoadError;
use crate::types::{ClimateRecord, CropRecord};

const REFERENCE_DATASET: &str = include_str!("../../data/reference_dataset.json");

/// Where to read reference data from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// The statistics bundled with the crate.
    Reference,
    /// A JSON document already in memory.
    Json(String),
    /// A JSON document on disk.
    File(PathBuf),
}

impl DatasetSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Reference => "built-in reference dataset".to_string(),
            Self::Json(_) => "inline JSON".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawClimate {
    state: String,
    year: RawNumber,
    rainfall_mm: RawNumber,
    avg_temperature_c: RawNumber,
}

#[derive(Debug, Deserialize)]
struct RawCrop {
    state: String,
    district: String,
    crop: String,
    year: RawNumber,
    production_tonnes: RawNumber,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    climate: Vec<RawClimate>,
    #[serde(default)]
    crops: Vec<RawCrop>,
}

/// Folds differently cased spellings of a name onto the first one seen.
#[derive(Default)]
struct NameTable {
    by_key: HashMap<String, String>,
}

impl NameTable {
    fn canonical(&mut self, raw: &str, record: &str, field: &str) -> Result<String, LoadError> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(LoadError::InvalidRecord {
                record: record.to_string(),
                reason: format!("field `{}` is blank", field),
            });
        }
        Ok(self
            .by_key
            .entry(normalized.to_lowercase())
            .or_insert(normalized)
            .clone())
    }
}

pub(crate) fn read_source(source: &DatasetSource) -> Result<String, LoadError> {
    match source {
        DatasetSource::Reference => Ok(REFERENCE_DATASET.to_string()),
        DatasetSource::Json(text) => Ok(text.clone()),
        DatasetSource::File(path) => std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.clone(),
            source: e,
        }),
    }
}

pub(crate) fn parse_records(text: &str) -> Result<(Vec<ClimateRecord>, Vec<CropRecord>), LoadError> {
    let raw: RawDataset = serde_json::from_str(text)?;

    let mut states = NameTable::default();
    let mut districts = NameTable::default();
    let mut crops = NameTable::default();

    let mut climate = Vec::with_capacity(raw.climate.len());
    for (idx, rec) in raw.climate.iter().enumerate() {
        let label = format!("climate[{}]", idx);
        let rainfall_mm = parse_quantity(&rec.rainfall_mm, &label, "rainfall_mm")?;
        if rainfall_mm < 0.0 {
            return Err(LoadError::InvalidRecord {
                record: label,
                reason: format!("negative rainfall {}", rainfall_mm),
            });
        }
        climate.push(ClimateRecord {
            state: states.canonical(&rec.state, &label, "state")?,
            year: parse_year(&rec.year, &label)?,
            rainfall_mm,
            avg_temperature_c: parse_quantity(&rec.avg_temperature_c, &label, "avg_temperature_c")?,
        });
    }

    let mut production = Vec::with_capacity(raw.crops.len());
    for (idx, rec) in raw.crops.iter().enumerate() {
        let label = format!("crops[{}]", idx);
        let production_tonnes = parse_quantity(&rec.production_tonnes, &label, "production_tonnes")?;
        if production_tonnes < 0.0 {
            return Err(LoadError::InvalidRecord {
                record: label,
                reason: format!("negative production {}", production_tonnes),
            });
        }
        production.push(CropRecord {
            state: states.canonical(&rec.state, &label, "state")?,
            district: districts.canonical(&rec.district, &label, "district")?,
            crop: crops.canonical(&rec.crop, &label, "crop")?,
            year: parse_year(&rec.year, &label)?,
            production_tonnes,
        });
    }

    Ok((climate, production))
}

fn parse_quantity(raw: &RawNumber, record: &str, field: &'static str) -> Result<f64, LoadError> {
    let value = match raw {
        RawNumber::Number(n) => Some(*n),
        RawNumber::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
    };
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(LoadError::InvalidNumber {
            record: record.to_string(),
            field,
            value: raw.as_text(),
        }),
    }
}

fn parse_year(raw: &RawNumber, record: &str) -> Result<i32, LoadError> {
    let value = parse_quantity(raw, record, "year")?;
    if value.fract() != 0.0 || !(1000.0..=9999.0).contains(&value) {
        return Err(LoadError::InvalidNumber {
            record: record.to_string(),
            field: "year",
            value: raw.as_text(),
        });
    }
    Ok(value as i32)
}
