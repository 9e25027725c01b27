//! Query Execution
//!
//! Runs the aggregation behind each intent against one dataset snapshot and
//! packages the result as an `AnswerResult`. Nothing here fails: unresolved
//! parameters, unknown intents and empty selections all map to an outcome.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::formatter::format_quantity;
use crate::dataset::DatasetStore;
use crate::types::{AnswerResult, Intent, ParsedQuery, Ranking, Row};

pub struct QueryExecutor<'a> {
    store: &'a DatasetStore,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a DatasetStore) -> Self {
        Self { store }
    }

    pub fn execute(&self, query: &ParsedQuery) -> AnswerResult {
        if query.intent == Intent::Unknown {
            return AnswerResult::not_understood();
        }
        if !query.is_complete() {
            return incomplete(query);
        }

        let range = query
            .year_range()
            .unwrap_or((self.store.known().min_year, self.store.known().max_year));

        let result = match (query.intent, query.states.as_slice(), query.crop.as_deref()) {
            (Intent::RainfallComparison, [first, second, ..], _) => {
                self.compare_rainfall(first, second, range)
            }
            (Intent::TopCropsByProduction, [state, ..], _) => {
                self.top_crops(state, query.top_n.unwrap_or(3).max(1), range)
            }
            (Intent::TopDistrictByCropProduction, [state, ..], Some(crop)) => {
                self.rank_districts(state, crop, query.ranking, range)
            }
            (Intent::CropProductionTrend, states, Some(crop)) => self.production_trend(
                crop,
                states.first().map(String::as_str),
                query.district.as_deref(),
                range,
            ),
            _ => {
                tracing::warn!(intent = ?query.intent, "Query marked complete but lacks parameters");
                AnswerResult::not_understood()
            }
        };

        tracing::debug!(
            intent = ?result.intent,
            outcome = ?result.outcome,
            rows = result.table_rows.len(),
            "Query executed"
        );
        result
    }

    fn compare_rainfall(&self, first: &str, second: &str, range: (i32, i32)) -> AnswerResult {
        let intent = Intent::RainfallComparison;
        let period = period_label(range);

        let mut averages = Vec::with_capacity(2);
        let mut years = Vec::new();
        for state in [first, second] {
            let records = self.store.records_for_state_year_range(state, range.0, range.1);
            if records.is_empty() {
                return AnswerResult::no_data(intent, &format!("rainfall in {} during {}", state, period));
            }
            years.extend(records.iter().map(|r| r.year));
            let n = records.len() as f64;
            let rainfall = records.iter().map(|r| r.rainfall_mm).sum::<f64>() / n;
            let temperature = records.iter().map(|r| r.avg_temperature_c).sum::<f64>() / n;
            averages.push((state, rainfall, temperature, records.len()));
        }

        let rows = averages
            .iter()
            .map(|(state, rainfall, temperature, years)| {
                row([
                    ("state", json!(state)),
                    ("average_rainfall_mm", json!(round1(*rainfall))),
                    ("average_temperature_c", json!(round1(*temperature))),
                    ("years_covered", json!(years)),
                ])
            })
            .collect();

        let period = covered_period(years, range);
        let (a, b) = (round1(averages[0].1), round1(averages[1].1));
        let summary = if a == b {
            format!(
                "{} and {} received the same average annual rainfall during {}: {} mm.",
                first,
                second,
                period,
                format_quantity(a)
            )
        } else {
            let ((wetter, high), (drier, low)) = if a > b {
                ((first, a), (second, b))
            } else {
                ((second, b), (first, a))
            };
            format!(
                "{} received higher average annual rainfall than {} during {}: {} mm vs {} mm, a difference of {} mm.",
                wetter,
                drier,
                period,
                format_quantity(high),
                format_quantity(low),
                format_quantity(round1(high - low))
            )
        };

        AnswerResult::answered(intent, summary, rows)
    }

    fn top_crops(&self, state: &str, top_n: usize, range: (i32, i32)) -> AnswerResult {
        let intent = Intent::TopCropsByProduction;
        let period = period_label(range);

        let records: Vec<_> = self
            .store
            .records_for_state(state)
            .into_iter()
            .filter(|r| in_range(r.year, range))
            .collect();
        if records.is_empty() {
            return AnswerResult::no_data(intent, &format!("crop production in {} during {}", state, period));
        }
        let period = covered_period(records.iter().map(|r| r.year), range);
        let totals = sum_by(records.iter().map(|r| (r.crop.as_str(), r.production_tonnes)));

        let ranked = rank(totals, Ranking::Highest);
        let available = ranked.len();
        let top: Vec<(&str, f64)> = ranked.into_iter().take(top_n).collect();

        let listing = top
            .iter()
            .map(|(crop, total)| format!("{} ({} tonnes)", crop, format_quantity(*total)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut summary = format!(
            "Top {} crops in {} by production during {}: {}.",
            top.len(),
            state,
            period,
            listing
        );
        if available < top_n {
            summary.push_str(&format!(
                " Only {} crops have production data, fewer than the {} requested.",
                available, top_n
            ));
        }

        let rows = top
            .iter()
            .enumerate()
            .map(|(i, (crop, total))| {
                row([
                    ("rank", json!(i + 1)),
                    ("crop", json!(crop)),
                    ("production_tonnes", json!(round1(*total))),
                ])
            })
            .collect();

        AnswerResult::answered(intent, summary, rows)
    }

    fn rank_districts(&self, state: &str, crop: &str, ranking: Ranking, range: (i32, i32)) -> AnswerResult {
        let intent = Intent::TopDistrictByCropProduction;

        let records: Vec<_> = self
            .store
            .records_for_state_crop(state, crop)
            .into_iter()
            .filter(|r| in_range(r.year, range))
            .collect();
        let period = covered_period(records.iter().map(|r| r.year), range);
        let ranked = rank(
            sum_by(records.iter().map(|r| (r.district.as_str(), r.production_tonnes))),
            ranking,
        );
        let Some(&(district, total)) = ranked.first() else {
            return AnswerResult::no_data(
                intent,
                &format!("{} production in {} during {}", crop, state, period),
            );
        };

        let summary = format!(
            "{} has the {} {} production in {} during {}: {} tonnes.",
            district,
            ranking.as_str(),
            crop,
            state,
            period,
            format_quantity(total)
        );

        let rows = ranked
            .iter()
            .enumerate()
            .map(|(i, (district, total))| {
                row([
                    ("rank", json!(i + 1)),
                    ("district", json!(district)),
                    ("production_tonnes", json!(round1(*total))),
                ])
            })
            .collect();

        AnswerResult::answered(intent, summary, rows)
    }

    fn production_trend(
        &self,
        crop: &str,
        state: Option<&str>,
        district: Option<&str>,
        range: (i32, i32),
    ) -> AnswerResult {
        let intent = Intent::CropProductionTrend;
        let period = period_label(range);
        let scope = district.or(state).unwrap_or("all states");

        let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
        for rec in self.store.records_for_crop_state(crop, state) {
            if in_range(rec.year, range) && district.map_or(true, |d| rec.district == d) {
                *by_year.entry(rec.year).or_insert(0.0) += rec.production_tonnes;
            }
        }
        if by_year.is_empty() {
            return AnswerResult::no_data(
                intent,
                &format!("{} production in {} during {}", crop, scope, period),
            );
        }

        let mut rows = Vec::with_capacity(by_year.len());
        let mut growth_rates = Vec::new();
        let mut previous: Option<f64> = None;
        for (&year, &total) in &by_year {
            let yoy = previous.and_then(|prev| growth_pct(prev, total));
            if let Some(g) = yoy {
                growth_rates.push(g);
            }

            let mut r = row([
                ("year", json!(year)),
                ("production_tonnes", json!(round1(total))),
                ("yoy_growth_pct", yoy.map_or_else(not_available, |g| json!(round1(g)))),
            ]);
            if let Some(state) = state {
                let rainfall = self
                    .store
                    .climate_for(state, year)
                    .map_or_else(not_available, |c| json!(round1(c.rainfall_mm)));
                r.insert("rainfall_mm".to_string(), rainfall);
            }
            rows.push(r);
            previous = Some(total);
        }

        let (first_year, first) = by_year.iter().next().map(|(y, t)| (*y, *t)).unwrap_or_default();
        let (last_year, last) = by_year.iter().next_back().map(|(y, t)| (*y, *t)).unwrap_or_default();

        let mut summary = if by_year.len() == 1 {
            format!(
                "{} production in {} was {} tonnes in {}; at least two years are needed to show a trend.",
                crop,
                scope,
                format_quantity(first),
                first_year
            )
        } else {
            match growth_pct(first, last) {
                Some(pct) => {
                    let movement = if round1(pct) == 0.0 {
                        "was unchanged".to_string()
                    } else if pct > 0.0 {
                        format!("grew {:.1}%", pct)
                    } else {
                        format!("declined {:.1}%", pct.abs())
                    };
                    format!(
                        "{} production in {} {} from {} tonnes in {} to {} tonnes in {}.",
                        crop,
                        scope,
                        movement,
                        format_quantity(first),
                        first_year,
                        format_quantity(last),
                        last_year
                    )
                }
                None => format!(
                    "{} production in {} went from {} tonnes in {} to {} tonnes in {}; overall growth is N/A from a zero base.",
                    crop,
                    scope,
                    format_quantity(first),
                    first_year,
                    format_quantity(last),
                    last_year
                ),
            }
        };
        if !growth_rates.is_empty() {
            let average = growth_rates.iter().sum::<f64>() / growth_rates.len() as f64;
            summary.push_str(&format!(" Average year-over-year growth: {:.1}%.", average));
        }

        AnswerResult::answered(intent, summary, rows)
    }
}

fn incomplete(query: &ParsedQuery) -> AnswerResult {
    let fields = query
        .missing
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" and ");

    let summary = match (query.intent, query.states.first()) {
        (Intent::RainfallComparison, Some(found)) => format!(
            "Comparing rainfall needs two states, but only {} was recognized. Please name a second state from the dataset.",
            found
        ),
        (Intent::RainfallComparison, None) => {
            "Comparing rainfall needs two states, but none were recognized. Please name two states from the dataset.".to_string()
        }
        (intent, _) => format!(
            "I couldn't identify the {} for this {} question. Please name a {} from the dataset.",
            fields,
            intent.display_name().to_lowercase(),
            fields
        ),
    };

    AnswerResult::incomplete(query.intent, query.missing.clone(), summary)
}

/// Sum values per key; keys come back in ascending order.
fn sum_by<'r>(items: impl Iterator<Item = (&'r str, f64)>) -> BTreeMap<&'r str, f64> {
    let mut totals = BTreeMap::new();
    for (key, value) in items {
        *totals.entry(key).or_insert(0.0) += value;
    }
    totals
}

/// Order totals by value in the requested direction, ties by name ascending.
fn rank(totals: BTreeMap<&str, f64>, ranking: Ranking) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| {
        let by_value = match ranking {
            Ranking::Highest => b.1.total_cmp(&a.1),
            Ranking::Lowest => a.1.total_cmp(&b.1),
        };
        by_value.then_with(|| a.0.cmp(b.0))
    });
    ranked
}

/// Percentage change, undefined from a zero base.
fn growth_pct(previous: f64, current: f64) -> Option<f64> {
    (previous != 0.0).then(|| (current - previous) / previous * 100.0)
}

fn in_range(year: i32, (from, to): (i32, i32)) -> bool {
    year >= from && year <= to
}

/// Label for the years rows were actually found in, or `requested` when there are none.
fn covered_period(years: impl IntoIterator<Item = i32>, requested: (i32, i32)) -> String {
    let years: Vec<i32> = years.into_iter().collect();
    match (years.iter().min(), years.iter().max()) {
        (Some(&from), Some(&to)) => period_label((from, to)),
        _ => period_label(requested),
    }
}

fn period_label((from, to): (i32, i32)) -> String {
    if from == to {
        from.to_string()
    } else {
        format!("{}-{}", from, to)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn not_available() -> Value {
    json!("N/A")
}

fn row<const N: usize>(cells: [(&str, Value); N]) -> Row {
    cells.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClimateRecord, CropRecord, MissingField, Outcome};

    fn crop(state: &str, district: &str, crop: &str, year: i32, production_tonnes: f64) -> CropRecord {
        CropRecord {
            state: state.to_string(),
            district: district.to_string(),
            crop: crop.to_string(),
            year,
            production_tonnes,
        }
    }

    fn climate(state: &str, year: i32, rainfall_mm: f64) -> ClimateRecord {
        ClimateRecord {
            state: state.to_string(),
            year,
            rainfall_mm,
            avg_temperature_c: 26.0,
        }
    }

    fn store() -> DatasetStore {
        DatasetStore::from_records(
            vec![
                climate("Goa", 2020, 3000.0),
                climate("Goa", 2021, 3200.0),
                climate("Kerala", 2020, 3100.0),
                climate("Kerala", 2021, 3100.0),
            ],
            vec![
                crop("Goa", "North Goa", "Rice", 2020, 0.0),
                crop("Goa", "North Goa", "Rice", 2021, 500.0),
                crop("Goa", "North Goa", "Rice", 2022, 450.0),
                crop("Goa", "South Goa", "Rice", 2022, 50.0),
                crop("Goa", "North Goa", "Cashew", 2021, 500.0),
                crop("Goa", "South Goa", "Coconut", 2021, 200.0),
                crop("Kerala", "Alappuzha", "Rice", 2021, 900.0),
            ],
        )
        .unwrap()
    }

    fn query(intent: Intent, states: &[&str], crop: Option<&str>) -> ParsedQuery {
        let mut q = ParsedQuery::new(intent);
        q.states = states.iter().map(|s| s.to_string()).collect();
        q.crop = crop.map(str::to_string);
        q
    }

    #[test]
    fn test_unknown_intent_not_understood() {
        let store = store();
        let result = QueryExecutor::new(&store).execute(&ParsedQuery::new(Intent::Unknown));
        assert_eq!(result.outcome, Outcome::NotUnderstood);
        assert!(result.table_rows.is_empty());
    }

    #[test]
    fn test_incomplete_names_missing_field() {
        let store = store();
        let mut q = query(Intent::TopCropsByProduction, &[], None);
        q.mark_missing(MissingField::State);
        let result = QueryExecutor::new(&store).execute(&q);
        assert_eq!(
            result.outcome,
            Outcome::Incomplete {
                missing: vec![MissingField::State]
            }
        );
        assert!(result.summary_text.contains("state"));
    }

    #[test]
    fn test_rainfall_tie() {
        let store = store();
        let mut q = query(Intent::RainfallComparison, &["Goa", "Kerala"], None);
        q.year_from = Some(2020);
        q.year_to = Some(2021);
        let result = QueryExecutor::new(&store).execute(&q);
        assert!(result.is_answered());
        assert!(result.summary_text.contains("the same average annual rainfall"));
        assert_eq!(result.table_rows[0]["average_rainfall_mm"], json!(3100.0));
        assert_eq!(result.table_rows[1]["years_covered"], json!(2));
    }

    #[test]
    fn test_period_reports_years_found() {
        let store = store();
        let executor = QueryExecutor::new(&store);

        let mut q = query(Intent::RainfallComparison, &["Goa", "Kerala"], None);
        q.year_from = Some(2000);
        q.year_to = Some(2030);
        assert!(executor.execute(&q).summary_text.contains("during 2020-2021"));

        let mut q = query(Intent::TopCropsByProduction, &["Goa"], None);
        q.year_from = Some(2014);
        q.year_to = Some(2023);
        assert!(executor.execute(&q).summary_text.contains("during 2020-2022"));

        let mut q = query(Intent::TopDistrictByCropProduction, &["Kerala"], Some("Rice"));
        q.year_from = Some(2014);
        q.year_to = Some(2023);
        assert!(executor.execute(&q).summary_text.contains("in Kerala during 2021:"));
    }

    #[test]
    fn test_rainfall_no_data_for_range() {
        let store = store();
        let mut q = query(Intent::RainfallComparison, &["Goa", "Kerala"], None);
        q.year_from = Some(1990);
        q.year_to = Some(1995);
        let result = QueryExecutor::new(&store).execute(&q);
        assert_eq!(result.outcome, Outcome::NoData);
        assert_eq!(result.summary_text, "No data found for rainfall in Goa during 1990-1995.");
    }

    #[test]
    fn test_top_crops_sorted_and_truncated() {
        let store = store();
        let mut q = query(Intent::TopCropsByProduction, &["Goa"], None);
        q.top_n = Some(2);
        let result = QueryExecutor::new(&store).execute(&q);
        let crops: Vec<&Value> = result.table_rows.iter().map(|r| &r["crop"]).collect();
        assert_eq!(crops, vec![&json!("Rice"), &json!("Cashew")]);
        assert_eq!(result.table_rows[0]["rank"], json!(1));
        assert_eq!(result.table_rows[0]["production_tonnes"], json!(1000.0));
    }

    #[test]
    fn test_rank_ties_break_alphabetically() {
        let totals: BTreeMap<&str, f64> = [("Wheat", 10.0), ("Barley", 10.0), ("Maize", 20.0)].into_iter().collect();
        let ranked: Vec<&str> = rank(totals.clone(), Ranking::Highest).into_iter().map(|(k, _)| k).collect();
        assert_eq!(ranked, vec!["Maize", "Barley", "Wheat"]);
        let ranked: Vec<&str> = rank(totals, Ranking::Lowest).into_iter().map(|(k, _)| k).collect();
        assert_eq!(ranked, vec!["Barley", "Wheat", "Maize"]);
    }

    #[test]
    fn test_top_crops_fewer_than_requested() {
        let store = store();
        let mut q = query(Intent::TopCropsByProduction, &["Goa"], None);
        q.top_n = Some(5);
        let result = QueryExecutor::new(&store).execute(&q);
        assert_eq!(result.table_rows.len(), 3);
        assert!(result.summary_text.contains("Only 3 crops"));
    }

    #[test]
    fn test_district_ranking_both_directions() {
        let store = store();
        let mut q = query(Intent::TopDistrictByCropProduction, &["Goa"], Some("Rice"));
        let result = QueryExecutor::new(&store).execute(&q);
        assert_eq!(result.table_rows[0]["district"], json!("North Goa"));
        assert!(result.summary_text.starts_with("North Goa has the highest Rice production in Goa"));

        q.ranking = Ranking::Lowest;
        let result = QueryExecutor::new(&store).execute(&q);
        assert_eq!(result.table_rows[0]["district"], json!("South Goa"));
        assert_eq!(result.table_rows.len(), 2);
    }

    #[test]
    fn test_district_no_data_for_crop_in_state() {
        let store = store();
        let q = query(Intent::TopDistrictByCropProduction, &["Kerala"], Some("Cashew"));
        let result = QueryExecutor::new(&store).execute(&q);
        assert_eq!(result.outcome, Outcome::NoData);
        assert!(result.summary_text.contains("Cashew production in Kerala"));
    }

    #[test]
    fn test_trend_zero_base_is_not_available() {
        let store = store();
        let q = query(Intent::CropProductionTrend, &["Goa"], Some("Rice"));
        let result = QueryExecutor::new(&store).execute(&q);

        let yoy: Vec<&Value> = result.table_rows.iter().map(|r| &r["yoy_growth_pct"]).collect();
        assert_eq!(yoy, vec![&json!("N/A"), &json!("N/A"), &json!(0.0)]);
        assert!(result.summary_text.contains("N/A from a zero base"));
        assert_eq!(result.table_rows[2]["rainfall_mm"], json!("N/A"));
        assert_eq!(result.table_rows[1]["rainfall_mm"], json!(3200.0));
    }

    #[test]
    fn test_trend_all_states_has_no_rainfall_column() {
        let store = store();
        let mut q = query(Intent::CropProductionTrend, &[], Some("Rice"));
        q.year_from = Some(2021);
        q.year_to = Some(2022);
        let result = QueryExecutor::new(&store).execute(&q);

        assert_eq!(result.table_rows.len(), 2);
        assert_eq!(result.table_rows[0]["production_tonnes"], json!(1400.0));
        assert!(!result.table_rows[0].contains_key("rainfall_mm"));
        assert!(result.summary_text.contains("all states declined 64.3%"));
    }

    #[test]
    fn test_trend_single_year() {
        let store = store();
        let q = query(Intent::CropProductionTrend, &["Kerala"], Some("Rice"));
        let result = QueryExecutor::new(&store).execute(&q);
        assert!(result.is_answered());
        assert!(result.summary_text.contains("at least two years"));
    }

    #[test]
    fn test_trend_district_filter() {
        let store = store();
        let mut q = query(Intent::CropProductionTrend, &[], Some("Rice"));
        q.district = Some("South Goa".to_string());
        let result = QueryExecutor::new(&store).execute(&q);
        assert_eq!(result.table_rows.len(), 1);
        assert_eq!(result.table_rows[0]["production_tonnes"], json!(50.0));
    }

    #[test]
    fn test_row_columns_keep_order() {
        let store = store();
        let q = query(Intent::CropProductionTrend, &["Goa"], Some("Rice"));
        let result = QueryExecutor::new(&store).execute(&q);
        let columns: Vec<&str> = result.table_rows[0].keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["year", "production_tonnes", "yoy_growth_pct", "rainfall_mm"]);
    }

    #[test]
    fn test_sources_attached_to_answers_only() {
        let store = store();
        let q = query(Intent::TopCropsByProduction, &["Goa"], None);
        let answered = QueryExecutor::new(&store).execute(&q);
        assert!(!answered.sources.is_empty());
        assert!(AnswerResult::not_understood().sources.is_empty());
    }
}
