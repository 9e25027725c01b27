//! Response Formatting
//!
//! Renders an `AnswerResult` as plain text: heading, summary, a pipe table in
//! the row's column order, then sources. Fallback and incomplete answers end
//! with the example question list.

use serde_json::Value;

use crate::types::{AnswerResult, Outcome, Row};

const SAMPLE_QUESTIONS: &[&str] = &[
    "Compare the average annual rainfall in Maharashtra and Punjab for the last 4 years",
    "List the top 3 most produced crops in Maharashtra",
    "Which district has the highest production of Rice in Maharashtra?",
    "Analyze the production trend of Rice in Punjab over the last decade",
];

/// Questions known to be answerable against the reference dataset.
pub fn sample_questions() -> &'static [&'static str] {
    SAMPLE_QUESTIONS
}

pub fn format(result: &AnswerResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n\n", heading(result)));
    out.push_str(&result.summary_text);
    out.push('\n');

    if !result.table_rows.is_empty() {
        out.push('\n');
        out.push_str(&render_table(&result.table_rows));
    }

    if !result.sources.is_empty() {
        out.push_str("\nSources:\n");
        for source in &result.sources {
            out.push_str(&format!("  - {}\n", source));
        }
    }

    if matches!(
        result.outcome,
        Outcome::NotUnderstood | Outcome::Incomplete { .. }
    ) {
        out.push_str("\nTry asking one of these:\n");
        for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, question));
        }
    }

    out
}

fn heading(result: &AnswerResult) -> &'static str {
    match result.outcome {
        Outcome::NotUnderstood => "Question Not Understood",
        _ => result.intent.display_name(),
    }
}

fn render_table(rows: &[Row]) -> String {
    // Union of columns in first-seen order; trend rows may add rainfall.
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let header: Vec<String> = columns.iter().map(|c| column_label(c)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(*c).map(render_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..columns.len())
        .map(|i| {
            body.iter()
                .map(|cells| cells[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut table = String::new();
    table.push_str(&table_line(&header, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    table.push_str(&format!("|-{}-|\n", rule.join("-|-")));
    for cells in &body {
        table.push_str(&table_line(cells, &widths));
    }
    table
}

fn table_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    format!("| {} |\n", padded.join(" | "))
}

/// `average_rainfall_mm` -> `Average Rainfall (mm)`.
fn column_label(key: &str) -> String {
    let (stem, unit) = match key.rsplit_once('_') {
        Some((stem, "mm")) => (stem, Some("mm")),
        Some((stem, "c")) => (stem, Some("°C")),
        Some((stem, "pct")) => (stem, Some("%")),
        Some((stem, "tonnes")) => (stem, Some("tonnes")),
        _ => (key, None),
    };

    let words: Vec<String> = stem
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| match w {
            "yoy" => "YoY".to_string(),
            _ => {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect();

    match unit {
        Some(unit) => format!("{} ({})", words.join(" "), unit),
        None => words.join(" "),
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64().map(format_quantity).unwrap_or_default(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One decimal place with thousands separators: `28260000.0` -> `28,260,000.0`.
pub(crate) fn format_quantity(value: f64) -> String {
    let fixed = format!("{:.1}", value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "0"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    let sign = if grouped.chars().all(|c| c == '0' || c == ',') && frac_part == "0" {
        ""
    } else {
        sign
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Intent, MissingField};
    use serde_json::json;

    fn row(cells: &[(&str, Value)]) -> Row {
        cells.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(0.0), "0.0");
        assert_eq!(format_quantity(487.5), "487.5");
        assert_eq!(format_quantity(1175.0), "1,175.0");
        assert_eq!(format_quantity(28_260_000.0), "28,260,000.0");
        assert_eq!(format_quantity(123_456.789), "123,456.8");
        assert_eq!(format_quantity(-1234.56), "-1,234.6");
        assert_eq!(format_quantity(-0.01), "0.0");
    }

    #[test]
    fn test_column_labels() {
        assert_eq!(column_label("average_rainfall_mm"), "Average Rainfall (mm)");
        assert_eq!(column_label("average_temperature_c"), "Average Temperature (°C)");
        assert_eq!(column_label("yoy_growth_pct"), "YoY Growth (%)");
        assert_eq!(column_label("production_tonnes"), "Production (tonnes)");
        assert_eq!(column_label("rank"), "Rank");
        assert_eq!(column_label("years_covered"), "Years Covered");
    }

    #[test]
    fn test_answer_renders_table_in_column_order() {
        let result = AnswerResult::answered(
            Intent::TopCropsByProduction,
            "Top 2 crops in Punjab.".to_string(),
            vec![
                row(&[("rank", json!(1)), ("crop", json!("Wheat")), ("production_tonnes", json!(11916300.0))]),
                row(&[("rank", json!(2)), ("crop", json!("Rice")), ("production_tonnes", json!(8666400.0))]),
            ],
        );
        let text = format(&result);

        assert!(text.starts_with("=== Top Crops by Production ===\n\nTop 2 crops in Punjab.\n"));
        assert!(text.contains("| Rank | Crop  | Production (tonnes) |\n"));
        assert!(text.contains("|------|-------|---------------------|\n"));
        assert!(text.contains("| 1    | Wheat | 11,916,300.0        |\n"));
        assert!(text.contains("Sources:\n  - Ministry of Agriculture & Farmers Welfare"));
        assert!(!text.contains("Try asking"));
    }

    #[test]
    fn test_mixed_cells_render() {
        let rows = vec![
            row(&[("year", json!(2019)), ("yoy_growth_pct", json!("N/A"))]),
            row(&[("year", json!(2020)), ("yoy_growth_pct", json!(3.4)), ("rainfall_mm", json!(650.0))]),
        ];
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Year | YoY Growth (%) | Rainfall (mm) |");
        assert_eq!(lines[2], "| 2019 | N/A            |               |");
        assert_eq!(lines[3], "| 2020 | 3.4            | 650.0         |");
    }

    #[test]
    fn test_fallback_lists_sample_questions() {
        let text = format(&AnswerResult::not_understood());
        assert!(text.starts_with("=== Question Not Understood ===\n\nI couldn't understand your question.\n"));
        assert!(text.contains("Try asking one of these:\n  1. Compare the average annual rainfall"));
        assert!(!text.contains("Sources:"));
    }

    #[test]
    fn test_incomplete_lists_sample_questions() {
        let result = AnswerResult::incomplete(
            Intent::TopCropsByProduction,
            vec![MissingField::State],
            "I couldn't identify the state.".to_string(),
        );
        let text = format(&result);
        assert!(text.contains("I couldn't identify the state."));
        assert!(text.contains("  4. Analyze the production trend"));
    }

    #[test]
    fn test_sample_questions_fixed() {
        assert_eq!(sample_questions().len(), 4);
    }
}
