// src/collector.rs
use crate::errors::{PredictError, Result};
use crate::models::EncodedPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of raw cell values, exactly as the UI holds them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Same shape as `self`, every value cleared.
    fn blank_like(&self) -> Self {
        Self {
            cells: vec![String::new(); self.cells.len()],
        }
    }
}

/// Which input surface is mounted. Fixed for the lifetime of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// One numeric input per cell.
    #[default]
    NumericGrid,
    /// Free-form cells joined into CSV.
    CsvGrid,
    /// A raw CSV text area.
    TextArea,
    /// Named fields of a non-table form.
    Form,
}

/// The surface together with whatever content it holds outside the row buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSurface {
    NumericGrid,
    CsvGrid,
    TextArea(String),
    Form(BTreeMap<String, String>),
}

impl InputSurface {
    pub fn kind(&self) -> SurfaceKind {
        match self {
            InputSurface::NumericGrid => SurfaceKind::NumericGrid,
            InputSurface::CsvGrid => SurfaceKind::CsvGrid,
            InputSurface::TextArea(_) => SurfaceKind::TextArea,
            InputSurface::Form(_) => SurfaceKind::Form,
        }
    }
}

/// The ordered rows of the input table. Never holds fewer than one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowBuffer {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RowBuffer {
    /// A buffer with one row pre-filled with `defaults`.
    pub fn new(columns: Vec<String>, defaults: Vec<String>) -> Self {
        let mut first = defaults;
        first.resize(columns.len(), String::new());
        Self {
            columns,
            rows: vec![Row::new(first)],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row shaped like the first one, with its values cleared.
    pub fn add_row(&mut self) {
        let template = match self.rows.first() {
            Some(first) => first.blank_like(),
            None => Row::new(vec![String::new(); self.columns.len()]),
        };
        self.rows.push(template);
    }

    /// Removes the row at `index`. Returns false when nothing was removed,
    /// either because the index is out of range or only one row is left.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows.len() <= 1 || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    pub fn remove_last(&mut self) -> bool {
        let last = self.rows.len().saturating_sub(1);
        self.remove_row(last)
    }

    /// Replaces the buffer contents with the values currently shown in the UI.
    /// Each row is padded or truncated to the column count. An empty
    /// submission leaves a single blank row so the floor of one row holds.
    pub fn set_values(&mut self, rows: Vec<Vec<String>>) {
        let width = self.columns.len();
        self.rows = rows
            .into_iter()
            .map(|mut cells| {
                if width > 0 {
                    cells.resize(width, String::new());
                }
                Row::new(cells)
            })
            .collect();
        if self.rows.is_empty() {
            self.rows.push(Row::new(vec![String::new(); width]));
        }
    }
}

/// Parses one cell. Anything that is not a finite number becomes `0.0`.
pub fn coerce_cell(raw: &str) -> f64 {
    parse_cell(raw).unwrap_or(0.0)
}

fn parse_cell(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Encodes the rows for the mounted surface.
pub fn encode(rows: &[Row], surface: &InputSurface) -> Result<EncodedPayload> {
    match surface {
        InputSurface::NumericGrid => {
            if rows.is_empty() {
                return Err(PredictError::EmptyInput);
            }
            Ok(EncodedPayload::NumericMatrix(numeric_matrix(rows)))
        }
        InputSurface::CsvGrid => {
            if rows.is_empty() {
                return Err(PredictError::EmptyInput);
            }
            let cells: Vec<Vec<&str>> = rows
                .iter()
                .map(|row| row.cells.iter().map(|c| c.trim()).collect())
                .collect();
            let text = delimited_text(&cells)?;
            if text.trim().is_empty() {
                return Err(PredictError::EmptyInput);
            }
            Ok(EncodedPayload::DelimitedText(text))
        }
        InputSurface::TextArea(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(PredictError::EmptyInput);
            }
            Ok(EncodedPayload::DelimitedText(trimmed.to_string()))
        }
        InputSurface::Form(fields) => {
            if fields.is_empty() {
                return Err(PredictError::EmptyInput);
            }
            Ok(EncodedPayload::FieldMap(fields.clone()))
        }
    }
}

fn numeric_matrix(rows: &[Row]) -> Vec<Vec<f64>> {
    rows.iter()
        .enumerate()
        .map(|(r, row)| {
            row.cells
                .iter()
                .enumerate()
                .map(|(c, cell)| match parse_cell(cell) {
                    Some(value) => value,
                    None => {
                        log::debug!("Cell ({}, {}) {:?} is not numeric, using 0", r + 1, c + 1, cell);
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

/// Writes rows as CSV: a cell is quoted only when it holds a comma, a quote
/// or a line break, and embedded quotes are doubled. A row made of a single
/// empty cell is an empty line. No trailing newline.
pub fn delimited_text<S: AsRef<[u8]>>(rows: &[Vec<S>]) -> Result<String> {
    let lines = rows
        .iter()
        .map(|row| match row.as_slice() {
            [only] if only.as_ref().is_empty() => Ok(String::new()),
            cells => csv_line(cells),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

fn csv_line<S: AsRef<[u8]>>(cells: &[S]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(cells)
        .map_err(|e| PredictError::Encode(e.to_string()))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| PredictError::Encode(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| PredictError::Encode(e.to_string()))?;
    Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
}
