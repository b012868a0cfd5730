//! Textual digests of tabular sources.
//!
//! CSV files are not chunked raw. They are first rendered into a plain
//! text digest (column types, a small sample, summary statistics and a
//! few domain-specific breakdowns) and the digest is what gets chunked
//! and embedded.

use std::collections::BTreeMap;
use std::path::Path;

use askdesk_core::{AppError, AppResult};

const SAMPLE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Text,
}

impl ColumnKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
        }
    }
}

/// Renders a CSV file into a plain text digest suitable for chunking.
pub fn digest_csv(path: &Path) -> AppResult<String> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Ingestion(format!("failed to open {}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Ingestion(format!("bad header in {}: {e}", path.display())))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| AppError::Ingestion(format!("bad record in {}: {e}", path.display())))?;
        rows.push(record.iter().map(|f| f.trim().to_string()).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| infer_kind(&rows, col))
        .collect();

    let mut out = String::new();

    out.push_str("Column Descriptions:\n");
    for (header, kind) in headers.iter().zip(&kinds) {
        out.push_str(&format!("- {header}: {}\n", kind.as_str()));
    }

    out.push_str(&format!("\nSample Data (first {SAMPLE_ROWS} rows):\n"));
    for row in rows.iter().take(SAMPLE_ROWS) {
        let line: Vec<String> = headers
            .iter()
            .zip(row)
            .map(|(h, v)| format!("{h}={v}"))
            .collect();
        out.push_str(&line.join(", "));
        out.push('\n');
    }

    let numeric_stats: Vec<(usize, NumericStats)> = headers
        .iter()
        .enumerate()
        .filter(|(col, _)| kinds[*col] == ColumnKind::Numeric)
        .filter_map(|(col, _)| NumericStats::compute(&rows, col).map(|s| (col, s)))
        .collect();

    if !numeric_stats.is_empty() {
        out.push_str("\nSummary Statistics:\n");
        for (col, stats) in &numeric_stats {
            out.push_str(&format!(
                "- {}: count={}, mean={:.2}, median={:.2}, min={:.2}, max={:.2}\n",
                headers[*col], stats.count, stats.mean, stats.median, stats.min, stats.max
            ));
        }
    }

    if let Some(col) = column_index(&headers, "department") {
        out.push_str("\nDepartment Distribution:\n");
        for (value, count) in value_counts(&rows, col) {
            out.push_str(&format!("- {value}: {count} employees\n"));
        }
    }

    if let Some(col) = column_index(&headers, "salary") {
        if let Some(stats) = NumericStats::compute(&rows, col) {
            out.push_str("\nSalary Insights:\n");
            out.push_str(&format!("- Average Salary: ${:.2}\n", stats.mean));
            out.push_str(&format!("- Median Salary: ${:.2}\n", stats.median));
            out.push_str(&format!(
                "- Salary Range: ${:.2} - ${:.2}\n",
                stats.min, stats.max
            ));
        }
    }

    if let Some(col) = column_index(&headers, "performance_rating") {
        if let Some(stats) = NumericStats::compute(&rows, col) {
            out.push_str("\nPerformance Insights:\n");
            out.push_str(&format!(
                "- Average Performance Rating: {:.2}\n",
                stats.mean
            ));
            out.push_str("- Performance Distribution:\n");
            for (value, count) in value_counts(&rows, col) {
                out.push_str(&format!("  - Rating {value}: {count} employees\n"));
            }
        }
    }

    Ok(out)
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// A column is numeric when every non-empty cell parses as a number.
fn infer_kind(rows: &[Vec<String>], col: usize) -> ColumnKind {
    let mut saw_value = false;
    for row in rows {
        match row.get(col).map(String::as_str) {
            Some("") | None => continue,
            Some(value) => {
                if value.parse::<f64>().is_err() {
                    return ColumnKind::Text;
                }
                saw_value = true;
            }
        }
    }
    if saw_value {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

/// Distinct cell values with their occurrence counts, sorted by value.
fn value_counts(rows: &[Vec<String>], col: usize) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        if let Some(value) = row.get(col) {
            if !value.is_empty() {
                *counts.entry(value.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}

#[derive(Debug)]
struct NumericStats {
    count: usize,
    mean: f64,
    median: f64,
    min: f64,
    max: f64,
}

impl NumericStats {
    fn compute(rows: &[Vec<String>], col: usize) -> Option<Self> {
        let mut values: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.get(col))
            .filter_map(|v| v.parse::<f64>().ok())
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (values[count / 2 - 1] + values[count / 2]) / 2.0
        } else {
            values[count / 2]
        };
        Some(Self {
            count,
            mean,
            median,
            min: values[0],
            max: values[count - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn digest_describes_columns_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "people.csv",
            "name,age\nAda,36\nGrace,45\nAlan,41\n",
        );
        let digest = digest_csv(&path).unwrap();

        assert!(digest.contains("- name: text"));
        assert!(digest.contains("- age: numeric"));
        assert!(digest.contains("name=Ada, age=36"));
        assert!(digest.contains("count=3"));
    }

    #[test]
    fn digest_reports_salary_and_rating_insights() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "hr.csv",
            "employee,department,salary,performance_rating\n\
             E1,engineering,100000,4\n\
             E2,engineering,80000,3\n\
             E3,finance,90000,4\n",
        );
        let digest = digest_csv(&path).unwrap();

        assert!(digest.contains("Department Distribution:"));
        assert!(digest.contains("- engineering: 2 employees"));
        assert!(digest.contains("- Average Salary: $90000.00"));
        assert!(digest.contains("- Median Salary: $90000.00"));
        assert!(digest.contains("- Salary Range: $80000.00 - $100000.00"));
        assert!(digest.contains("  - Rating 4: 2 employees"));
    }

    #[test]
    fn malformed_csv_is_an_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "broken.csv", "a,b\n1,2,3,4,5\n");
        let err = digest_csv(&path).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn empty_cells_do_not_break_type_inference() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "gaps.csv", "x,y\n1,\n2,hello\n,world\n");
        let digest = digest_csv(&path).unwrap();
        assert!(digest.contains("- x: numeric"));
        assert!(digest.contains("- y: text"));
    }
}
