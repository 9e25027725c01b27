//! In-memory climate and crop statistics.
//!
//! A `DatasetStore` is built once and never mutated. Request handling shares it
//! through `Arc`; `DatasetHandle` allows swapping in a freshly loaded store
//! without disturbing requests already holding the previous snapshot.

mod loader;

pub use loader::DatasetSource;

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::error::LoadError;
use crate::types::{ClimateRecord, CropRecord};

/// Authoritative value domain used to validate extracted entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownValueSets {
    pub states: Vec<String>,
    pub crops: Vec<String>,
    pub districts: Vec<String>,
    pub min_year: i32,
    pub max_year: i32,
}

impl KnownValueSets {
    fn derive(climate: &[ClimateRecord], crops: &[CropRecord]) -> Option<Self> {
        let mut states = BTreeSet::new();
        let mut crop_names = BTreeSet::new();
        let mut districts = BTreeSet::new();
        let mut years = BTreeSet::new();

        for rec in climate {
            states.insert(rec.state.clone());
            years.insert(rec.year);
        }
        for rec in crops {
            states.insert(rec.state.clone());
            crop_names.insert(rec.crop.clone());
            districts.insert(rec.district.clone());
            years.insert(rec.year);
        }

        let min_year = *years.iter().next()?;
        let max_year = *years.iter().next_back()?;

        Some(Self {
            states: states.into_iter().collect(),
            crops: crop_names.into_iter().collect(),
            districts: districts.into_iter().collect(),
            min_year,
            max_year,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatasetStore {
    climate: Vec<ClimateRecord>,
    crops: Vec<CropRecord>,
    known: KnownValueSets,
}

impl DatasetStore {
    /// Load and validate reference data. Any failure here is fatal for startup.
    pub fn load(source: DatasetSource) -> Result<Self, LoadError> {
        let text = loader::read_source(&source)?;
        let (climate, crops) = loader::parse_records(&text)?;
        let store = Self::from_records(climate, crops)?;
        tracing::info!(
            source = %source.describe(),
            climate_records = store.climate.len(),
            crop_records = store.crops.len(),
            states = store.known.states.len(),
            min_year = store.known.min_year,
            max_year = store.known.max_year,
            "Dataset loaded"
        );
        Ok(store)
    }

    /// The statistics bundled with the crate.
    pub fn reference() -> Result<Self, LoadError> {
        Self::load(DatasetSource::Reference)
    }

    /// Build a store from already-parsed records, enforcing key uniqueness.
    pub fn from_records(
        mut climate: Vec<ClimateRecord>,
        mut crops: Vec<CropRecord>,
    ) -> Result<Self, LoadError> {
        check_unique(climate.iter().map(|r| (r.state.as_str(), r.year)), |(state, year)| {
            LoadError::DuplicateKey {
                kind: "climate",
                key: format!("({}, {})", state, year),
            }
        })?;
        check_unique(
            crops
                .iter()
                .map(|r| (r.state.as_str(), r.district.as_str(), r.crop.as_str(), r.year)),
            |(state, district, crop, year)| LoadError::DuplicateKey {
                kind: "crop",
                key: format!("({}, {}, {}, {})", state, district, crop, year),
            },
        )?;

        let known = KnownValueSets::derive(&climate, &crops).ok_or(LoadError::Empty)?;

        climate.sort_by(|a, b| a.state.cmp(&b.state).then(a.year.cmp(&b.year)));
        crops.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| a.state.cmp(&b.state))
                .then_with(|| a.crop.cmp(&b.crop))
                .then_with(|| a.district.cmp(&b.district))
        });

        Ok(Self {
            climate,
            crops,
            known,
        })
    }

    pub fn known(&self) -> &KnownValueSets {
        &self.known
    }

    pub fn climate_records(&self) -> &[ClimateRecord] {
        &self.climate
    }

    /// Climate rows for `state` with `from <= year <= to`, ascending by year.
    pub fn records_for_state_year_range(&self, state: &str, from: i32, to: i32) -> Vec<&ClimateRecord> {
        self.climate
            .iter()
            .filter(|r| r.state == state && r.year >= from && r.year <= to)
            .collect()
    }

    pub fn climate_for(&self, state: &str, year: i32) -> Option<&ClimateRecord> {
        self.climate
            .iter()
            .find(|r| r.state == state && r.year == year)
    }

    /// Production rows for `crop`, optionally limited to one state, ascending by year.
    pub fn records_for_crop_state(&self, crop: &str, state: Option<&str>) -> Vec<&CropRecord> {
        self.crops
            .iter()
            .filter(|r| r.crop == crop && state.map_or(true, |s| r.state == s))
            .collect()
    }

    /// Production rows for one crop within one state, ascending by year.
    pub fn records_for_state_crop(&self, state: &str, crop: &str) -> Vec<&CropRecord> {
        self.records_for_crop_state(crop, Some(state))
    }

    /// Every production row of a state, ascending by year.
    pub fn records_for_state(&self, state: &str) -> Vec<&CropRecord> {
        self.crops.iter().filter(|r| r.state == state).collect()
    }
}

fn check_unique<K, I, F>(keys: I, on_duplicate: F) -> Result<(), LoadError>
where
    K: std::hash::Hash + Eq + Copy,
    I: IntoIterator<Item = K>,
    F: Fn(K) -> LoadError,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(on_duplicate(key));
        }
    }
    Ok(())
}

/// Shared, swappable reference to the current dataset.
///
/// Readers take a snapshot and keep using it for the whole request; a reload
/// replaces the pointer wholesale and never edits a published store.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    current: Arc<RwLock<Arc<DatasetStore>>>,
}

impl DatasetHandle {
    pub fn new(store: DatasetStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    pub fn snapshot(&self) -> Arc<DatasetStore> {
        self.current.read().clone()
    }

    /// Publish a new store, returning the one it replaced.
    pub fn replace(&self, store: DatasetStore) -> Arc<DatasetStore> {
        let next = Arc::new(store);
        tracing::info!(
            climate_records = next.climate.len(),
            crop_records = next.crops.len(),
            "Dataset replaced"
        );
        std::mem::replace(&mut *self.current.write(), next)
    }
}
