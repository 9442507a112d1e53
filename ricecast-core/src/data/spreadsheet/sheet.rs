//! Untyped worksheet grid and the calamine loader behind it.
//!
//! A [`RawSheet`] is positioned like the worksheet itself: row 0 is the
//! sheet's first row even when calamine's used range starts further down.

use crate::data::provider::DataError;
use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::NaiveDateTime;
use std::io::Cursor;

/// One worksheet cell, with no type assumed for the column it sits in.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error,
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Display form used for label matching.
    ///
    /// Integral numbers print without a fractional part so a year cell holding
    /// `1990.0` reads as `1990`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty | Cell::Error => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => dt.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Error),
            Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map(Cell::DateTime)
                .unwrap_or_else(|_| Cell::Text(s.clone())),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) => Cell::Error,
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A worksheet loaded as a ragged grid of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> &[Cell] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at `(row, col)`; out-of-range positions read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// All cell texts of a row joined with single spaces.
    pub fn row_text(&self, index: usize) -> String {
        self.row(index)
            .iter()
            .map(Cell::as_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An opened workbook held in memory.
pub struct Workbook {
    sheets: Sheets<Cursor<Vec<u8>>>,
}

impl Workbook {
    /// Open xlsx/xlsm/xls/ods bytes; the format is sniffed from the content.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DataError> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| DataError::Workbook(e.to_string()))?;
        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// First sheet whose name mentions "monthly", else the first sheet.
    pub fn pick_monthly_sheet(&self) -> Option<String> {
        pick_monthly(&self.sheet_names())
    }

    /// Load a sheet into a [`RawSheet`].
    pub fn read_sheet(&mut self, name: &str) -> Result<RawSheet, DataError> {
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| DataError::Workbook(format!("sheet '{name}': {e}")))?;

        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
        for data_row in range.rows() {
            let mut row = vec![Cell::Empty; col_offset];
            row.extend(data_row.iter().map(Cell::from_data));
            rows.push(row);
        }

        Ok(RawSheet::new(name, rows))
    }
}

pub(crate) fn pick_monthly(names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|n| n.to_lowercase().contains("monthly"))
        .or_else(|| names.first())
        .cloned()
}
