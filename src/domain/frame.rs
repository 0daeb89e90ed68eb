//! A small column-typed table for the aggregate extracts.
//!
//! The aggregate CSVs are produced upstream and their column sets change
//! between extraction runs, so they are kept as generic frames instead of
//! fixed structs. Only the grouping keys and the sort score are required.

use crate::utils::error::{DashboardError, Result};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    name: String,
    columns: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<Vec<Cell>>,
}

/// Parses a number the way the extracts write them; anything else is no value.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Frame {
    /// Reads a CSV extract.
    ///
    /// `required` columns must be present in the header. `numeric` columns are
    /// always coerced to numbers and `text` columns are always kept as text;
    /// every other column becomes numeric only when all of its non-empty cells
    /// parse. Header names are trimmed.
    pub fn from_csv(
        name: &str,
        data: &[u8],
        required: &[&str],
        numeric: &[&str],
        text: &[&str],
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(data);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        for field in required {
            if !columns.iter().any(|c| c == field) {
                return Err(DashboardError::MissingField {
                    dataset: name.to_string(),
                    field: field.to_string(),
                });
            }
        }

        let mut raw_rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            raw_rows.push(
                (0..columns.len())
                    .map(|i| record.get(i).unwrap_or("").to_string())
                    .collect::<Vec<_>>(),
            );
        }

        let types: Vec<ColumnType> = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                if text.contains(&column.as_str()) {
                    return ColumnType::Text;
                }
                let forced = numeric.contains(&column.as_str());
                infer_column_type(raw_rows.iter().map(|r| r[idx].as_str()), forced)
            })
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|raw| {
                raw.into_iter()
                    .zip(&types)
                    .map(|(value, ty)| match ty {
                        ColumnType::Integer | ColumnType::Float => {
                            coerce_number(&value).map_or(Cell::Missing, Cell::Number)
                        }
                        ColumnType::Text if value.trim().is_empty() => Cell::Missing,
                        ColumnType::Text => Cell::Text(value),
                    })
                    .collect()
            })
            .collect();

        tracing::debug!("Loaded frame '{}' with {} columns", name, columns.len());

        Ok(Self {
            name: name.to_string(),
            columns,
            types,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_type(&self, idx: usize) -> ColumnType {
        self.types[idx]
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Cell rendered as a key string. Numeric keys (e.g. codes) are printed
    /// without a fractional part when they are integral.
    pub fn key(&self, row: usize, column: &str) -> Option<String> {
        match self.cell(row, column)? {
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(v) if v.fract() == 0.0 => Some(format!("{:.0}", v)),
            Cell::Number(v) => Some(v.to_string()),
            Cell::Missing => None,
        }
    }

    /// Copy sorted by `column` descending, missing values last; ties keep
    /// their extract order.
    pub fn sorted_desc(&self, column: &str) -> Frame {
        let mut sorted = self.clone();
        if let Some(idx) = self.column_index(column) {
            sorted
                .rows
                .sort_by(|a, b| compare_desc_missing_last(a[idx].as_number(), b[idx].as_number()));
        }
        sorted
    }
}

fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>, forced_numeric: bool) -> ColumnType {
    let mut saw_value = false;
    let mut all_integer = true;
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        saw_value = true;
        if trimmed.parse::<i64>().is_err() {
            all_integer = false;
            if !forced_numeric && trimmed.parse::<f64>().is_err() {
                return ColumnType::Text;
            }
        }
    }

    match (saw_value, all_integer) {
        (true, true) => ColumnType::Integer,
        (true, false) => ColumnType::Float,
        (false, _) if forced_numeric => ColumnType::Float,
        (false, _) => ColumnType::Text,
    }
}

/// Descending order for optional numbers with `None` after every value.
pub fn compare_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUNICIPIOS: &str = "departamento,municipio,n_proyectos,presupuesto_vigente,score_concentracion_baja_ejec\n\
Guatemala,Mixco,12,1500.5,0.4\n\
Petén,Flores,3,,0.9\n\
Quiché,Nebaj,7,200,n/a\n";

    #[test]
    fn test_from_csv_infers_types() {
        let frame = Frame::from_csv(
            "municipios",
            MUNICIPIOS.as_bytes(),
            &["departamento", "municipio"],
            &["presupuesto_vigente", "score_concentracion_baja_ejec"],
            &[],
        )
        .unwrap();

        assert_eq!(frame.len(), 3);
        assert_eq!(frame.column_type(0), ColumnType::Text);
        assert_eq!(frame.column_type(2), ColumnType::Integer);
        assert_eq!(frame.column_type(3), ColumnType::Float);
        assert_eq!(frame.cell(1, "presupuesto_vigente"), Some(&Cell::Missing));
        // Forced numeric columns coerce garbage to no value.
        assert_eq!(frame.cell(2, "score_concentracion_baja_ejec"), Some(&Cell::Missing));
    }

    #[test]
    fn test_from_csv_missing_required_column() {
        let err = Frame::from_csv("codede", b"municipio,score\nMixco,1\n", &["departamento"], &[], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingField { dataset, field } if dataset == "codede" && field == "departamento"
        ));
    }

    #[test]
    fn test_sorted_desc_puts_missing_last() {
        let frame = Frame::from_csv(
            "municipios",
            MUNICIPIOS.as_bytes(),
            &[],
            &["score_concentracion_baja_ejec"],
            &[],
        )
        .unwrap();
        let sorted = frame.sorted_desc("score_concentracion_baja_ejec");

        assert_eq!(sorted.key(0, "municipio").as_deref(), Some("Flores"));
        assert_eq!(sorted.key(1, "municipio").as_deref(), Some("Mixco"));
        assert_eq!(sorted.key(2, "municipio").as_deref(), Some("Nebaj"));
        // Original untouched.
        assert_eq!(frame.key(0, "municipio").as_deref(), Some("Mixco"));
    }

    #[test]
    fn test_key_formats_integral_numbers() {
        let frame = Frame::from_csv("codes", b"codigo,nombre\n1,a\n2,b\n", &[], &[], &[]).unwrap();
        assert_eq!(frame.key(1, "codigo").as_deref(), Some("2"));
        assert_eq!(frame.key(5, "codigo"), None);
    }

    #[test]
    fn test_text_columns_keep_leading_zeros() {
        let frame = Frame::from_csv(
            "codede",
            b" departamento ,score_concentracion_baja_ejec\n01,0.5\n02,0.7\n",
            &["departamento"],
            &["score_concentracion_baja_ejec"],
            &["departamento"],
        )
        .unwrap();
        assert_eq!(frame.column_type(0), ColumnType::Text);
        assert_eq!(frame.key(0, "departamento").as_deref(), Some("01"));
        assert_eq!(
            frame.sorted_desc("score_concentracion_baja_ejec").key(0, "departamento").as_deref(),
            Some("02")
        );
    }
}
