//! Layout discovery: where in a worksheet does the target series live?
//!
//! Upstream workbooks drift, so discovery is a pluggable strategy. A locator
//! never fails; it either finds a layout or reports `NotFound`, and the
//! adapter turns `NotFound` into a header-only output file.

use super::sheet::{Cell, RawSheet};
use regex::Regex;

/// Only the top of the sheet is searched for labels.
pub const LABEL_SCAN_ROWS: usize = 200;

/// Rows searched on either side of the label row for a year header.
pub const HEADER_WINDOW: usize = 5;

/// Where the series sits once found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesLayout {
    /// Wide layout: one row of prices, periods across the header row.
    Row { header_row: usize, data_row: usize },
    /// Long layout: one column of prices, periods down column 0.
    Column { header_row: usize, data_col: usize },
}

/// Outcome of a layout search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located {
    Found(SeriesLayout),
    NotFound,
}

/// Strategy for finding the target series in a worksheet.
pub trait LayoutLocator: Send + Sync {
    fn name(&self) -> &str;

    fn locate(&self, sheet: &RawSheet) -> Located;
}

/// Finds the series as a labelled row with period columns.
///
/// 1. First row (within [`LABEL_SCAN_ROWS`]) whose joined text matches the
///    label pattern.
/// 2. Header row: first row within ±[`HEADER_WINDOW`] of it holding a
///    four-digit year token, else the row just above the label.
/// 3. Below that header, exactly one row whose first cell mentions every
///    required keyword.
pub struct RowLabelLocator {
    label: Regex,
    keywords: Vec<String>,
}

impl RowLabelLocator {
    /// `keywords` are matched case-insensitively against column 0.
    pub fn new(label_pattern: &str, keywords: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            label: Regex::new(label_pattern)?,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    fn find_label_row(&self, sheet: &RawSheet) -> Option<usize> {
        (0..sheet.height().min(LABEL_SCAN_ROWS)).find(|&i| self.label.is_match(&sheet.row_text(i)))
    }

    fn find_header_row(sheet: &RawSheet, label_row: usize) -> usize {
        let lo = label_row.saturating_sub(HEADER_WINDOW);
        let hi = (label_row + HEADER_WINDOW).min(sheet.height());
        (lo..hi)
            .find(|&j| sheet.row(j).iter().any(is_year_token))
            .unwrap_or(label_row.saturating_sub(1))
    }

    fn matches_keywords(&self, cell: &Cell) -> bool {
        let text = cell.as_text().to_lowercase();
        self.keywords.iter().all(|k| text.contains(k.as_str()))
    }
}

impl Default for RowLabelLocator {
    /// "Rice (Thailand), 5% broken", tolerant of spacing around "5%".
    fn default() -> Self {
        Self::new(
            r"(?i)rice\s*\(thailand\).*5\s*%.*broken",
            &["rice", "thailand", "5"],
        )
        .expect("valid regex")
    }
}

impl LayoutLocator for RowLabelLocator {
    fn name(&self) -> &str {
        "row_label"
    }

    fn locate(&self, sheet: &RawSheet) -> Located {
        let Some(label_row) = self.find_label_row(sheet) else {
            return Located::NotFound;
        };
        let header_row = Self::find_header_row(sheet, label_row);

        let mut candidates =
            ((header_row + 1)..sheet.height()).filter(|&r| self.matches_keywords(sheet.cell(r, 0)));

        match (candidates.next(), candidates.next()) {
            (Some(data_row), None) => Located::Found(SeriesLayout::Row {
                header_row,
                data_row,
            }),
            (None, _) => {
                tracing::debug!(label_row, header_row, "no keyword match below header");
                Located::NotFound
            }
            (Some(_), Some(_)) => {
                tracing::debug!(label_row, header_row, "keyword match is ambiguous");
                Located::NotFound
            }
        }
    }
}

/// Finds the series as a labelled column with periods down column 0.
///
/// This is how the CMO monthly workbook is actually laid out: commodity names
/// across a header row, one `YYYYMmm` period per row.
pub struct ColumnLabelLocator {
    label: Regex,
}

impl ColumnLabelLocator {
    pub fn new(label_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label: Regex::new(label_pattern)?,
        })
    }
}

impl Default for ColumnLabelLocator {
    /// "Rice, Thai 5%" and close variants.
    fn default() -> Self {
        Self::new(r"(?i)rice\s*,?\s*\(?thai(land)?\)?\s*,?\s*\(?5\s*%").expect("valid regex")
    }
}

impl LayoutLocator for ColumnLabelLocator {
    fn name(&self) -> &str {
        "column_label"
    }

    fn locate(&self, sheet: &RawSheet) -> Located {
        for r in 0..sheet.height().min(LABEL_SCAN_ROWS) {
            let hit = sheet
                .row(r)
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, cell)| self.label.is_match(&cell.as_text()));
            if let Some((data_col, _)) = hit {
                return Located::Found(SeriesLayout::Column {
                    header_row: r,
                    data_col,
                });
            }
        }
        Located::NotFound
    }
}

/// Tries each locator in turn; the first `Found` wins.
pub struct LocatorChain {
    locators: Vec<Box<dyn LayoutLocator>>,
}

impl LocatorChain {
    pub fn new(locators: Vec<Box<dyn LayoutLocator>>) -> Self {
        Self { locators }
    }
}

impl Default for LocatorChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(RowLabelLocator::default()),
            Box::new(ColumnLabelLocator::default()),
        ])
    }
}

impl LayoutLocator for LocatorChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn locate(&self, sheet: &RawSheet) -> Located {
        for locator in &self.locators {
            if let Located::Found(layout) = locator.locate(sheet) {
                tracing::debug!(locator = locator.name(), ?layout, "layout found");
                return Located::Found(layout);
            }
        }
        Located::NotFound
    }
}

/// A cell that looks like a four-digit year.
fn is_year_token(cell: &Cell) -> bool {
    match cell {
        Cell::Text(s) => {
            let t = s.trim();
            t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit())
        }
        Cell::Number(n) => n.fract() == 0.0 && (1000.0..=9999.0).contains(n),
        _ => false,
    }
}

/// Pull `(period, price)` cell pairs out of a located series.
///
/// Pairs whose period cell is blank are skipped.
pub fn extract_pairs(sheet: &RawSheet, layout: SeriesLayout) -> Vec<(Cell, Cell)> {
    let pairs: Vec<(Cell, Cell)> = match layout {
        SeriesLayout::Row {
            header_row,
            data_row,
        } => {
            let width = sheet.row(header_row).len().max(sheet.row(data_row).len());
            // Column 0 holds the label, not a period.
            (1..width)
                .map(|c| {
                    (
                        sheet.cell(header_row, c).clone(),
                        sheet.cell(data_row, c).clone(),
                    )
                })
                .collect()
        }
        SeriesLayout::Column {
            header_row,
            data_col,
        } => ((header_row + 1)..sheet.height())
            .map(|r| (sheet.cell(r, 0).clone(), sheet.cell(r, data_col).clone()))
            .collect(),
    };
    pairs
        .into_iter()
        .filter(|(period, _)| !period.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    /// Title rows, a year header two rows above the series, then the series.
    fn wide_sheet() -> RawSheet {
        RawSheet::new(
            "Monthly Prices",
            vec![
                vec![t("World Bank Commodity Price Data")],
                vec![t("Monthly prices in nominal US dollars")],
                vec![t(""), t("1990M01"), t("1990M02"), t("1990M03")],
                vec![t("Commodity"), t("1990"), t("1990"), t("1990")],
                vec![t("Maize"), n(110.0), n(112.0), n(115.0)],
                vec![t("Rice (Thailand), 5% broken"), n(290.0), n(295.5), t("…")],
                vec![t("Wheat"), n(140.0), n(141.0), n(139.0)],
            ],
        )
    }

    #[test]
    fn row_locator_finds_label_and_year_header() {
        // Row 3 is the first in the window with a year token.
        let located = RowLabelLocator::default().locate(&wide_sheet());
        assert_eq!(
            located,
            Located::Found(SeriesLayout::Row {
                header_row: 3,
                data_row: 5
            })
        );
    }

    #[test]
    fn row_locator_defaults_header_to_row_above_label() {
        let sheet = RawSheet::new(
            "Monthly",
            vec![
                vec![t("Period"), t("Jan 1990"), t("Feb 1990")],
                vec![t("Rice (Thailand), 5 % broken"), n(290.0), n(295.0)],
            ],
        );
        assert_eq!(
            RowLabelLocator::default().locate(&sheet),
            Located::Found(SeriesLayout::Row {
                header_row: 0,
                data_row: 1
            })
        );
    }

    #[test]
    fn row_locator_reports_not_found_without_label() {
        let sheet = RawSheet::new(
            "Monthly",
            vec![vec![t("Maize"), n(1.0)], vec![t("Wheat"), n(2.0)]],
        );
        assert_eq!(RowLabelLocator::default().locate(&sheet), Located::NotFound);
    }

    #[test]
    fn row_locator_rejects_ambiguous_matches() {
        let sheet = RawSheet::new(
            "Monthly",
            vec![
                vec![t(""), t("1990")],
                vec![t("Rice (Thailand), 5% broken"), n(290.0)],
                vec![t("Rice (Thailand), 25% broken"), n(270.0)],
            ],
        );
        assert_eq!(RowLabelLocator::default().locate(&sheet), Located::NotFound);
    }

    #[test]
    fn row_locator_ignores_labels_below_scan_limit() {
        let mut rows = vec![vec![t("filler")]; LABEL_SCAN_ROWS];
        rows.push(vec![t("Rice (Thailand), 5% broken"), n(290.0)]);
        let sheet = RawSheet::new("Monthly", rows);
        assert_eq!(RowLabelLocator::default().locate(&sheet), Located::NotFound);
    }

    #[test]
    fn column_locator_finds_cmo_layout() {
        let sheet = RawSheet::new(
            "Monthly Prices",
            vec![
                vec![t("World Bank Commodity Price Data (The Pink Sheet)")],
                vec![t(""), t("Maize"), t("Rice, Thai 5%"), t("Wheat, US HRW")],
                vec![t(""), t("($/mt)"), t("($/mt)"), t("($/mt)")],
                vec![t("1960M01"), n(45.0), n(120.0), n(60.0)],
            ],
        );
        assert_eq!(
            ColumnLabelLocator::default().locate(&sheet),
            Located::Found(SeriesLayout::Column {
                header_row: 1,
                data_col: 2
            })
        );
    }

    #[test]
    fn chain_falls_through_to_column_locator() {
        let sheet = RawSheet::new(
            "Monthly Prices",
            vec![
                vec![t(""), t("Rice, Thai 5%")],
                vec![t("1960M01"), n(120.0)],
            ],
        );
        assert_eq!(
            LocatorChain::default().locate(&sheet),
            Located::Found(SeriesLayout::Column {
                header_row: 0,
                data_col: 1
            })
        );
    }

    #[test]
    fn chain_reports_not_found_when_every_locator_misses() {
        let sheet = RawSheet::new("Monthly", vec![vec![t("Maize"), n(1.0)]]);
        assert_eq!(LocatorChain::default().locate(&sheet), Located::NotFound);
    }

    #[test]
    fn extracts_row_pairs_skipping_label_column() {
        let sheet = wide_sheet();
        let pairs = extract_pairs(
            &sheet,
            SeriesLayout::Row {
                header_row: 2,
                data_row: 5,
            },
        );
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], (t("1990M01"), n(290.0)));
        assert_eq!(pairs[2], (t("1990M03"), t("…")));
    }

    #[test]
    fn extracts_column_pairs_below_header() {
        let sheet = RawSheet::new(
            "Monthly Prices",
            vec![
                vec![t(""), t("Rice, Thai 5%")],
                vec![t(""), t("($/mt)")],
                vec![t("1960M01"), n(120.0)],
            ],
        );
        let pairs = extract_pairs(
            &sheet,
            SeriesLayout::Column {
                header_row: 0,
                data_col: 1,
            },
        );
        assert_eq!(pairs, vec![(t("1960M01"), n(120.0))]);
    }

    #[test]
    fn blank_period_cells_are_skipped() {
        let sheet = RawSheet::new(
            "Monthly",
            vec![
                vec![t(""), t("1990"), Cell::Empty, t("  "), t("1991")],
                vec![t("Rice (Thailand), 5% broken"), n(290.0), n(1.0), n(2.0), n(300.0)],
            ],
        );
        let pairs = extract_pairs(
            &sheet,
            SeriesLayout::Row {
                header_row: 0,
                data_row: 1,
            },
        );
        assert_eq!(pairs, vec![(t("1990"), n(290.0)), (t("1991"), n(300.0))]);
    }

    /// `year_at` holds a year header; the label sits at `label_at`.
    fn sheet_with_year_row(year_at: usize, label_at: usize) -> RawSheet {
        let height = year_at.max(label_at) + 1;
        let mut rows = vec![vec![t("notes")]; height];
        rows[year_at] = vec![t(""), t("1990"), t("1991")];
        rows[label_at] = vec![t("Rice (Thailand), 5% broken"), n(290.0), n(300.0)];
        RawSheet::new("Monthly", rows)
    }

    #[test]
    fn year_row_five_above_label_is_the_header() {
        let sheet = sheet_with_year_row(0, 5);
        assert_eq!(
            RowLabelLocator::default().locate(&sheet),
            Located::Found(SeriesLayout::Row {
                header_row: 0,
                data_row: 5
            })
        );
    }

    #[test]
    fn year_row_five_below_label_is_outside_the_window() {
        let sheet = sheet_with_year_row(11, 6);
        assert_eq!(
            RowLabelLocator::default().locate(&sheet),
            Located::Found(SeriesLayout::Row {
                header_row: 5,
                data_row: 6
            })
        );
    }

    #[test]
    fn year_row_four_below_label_is_inside_the_window() {
        let sheet = sheet_with_year_row(10, 6);
        assert_eq!(RowLabelLocator::find_header_row(&sheet, 6), 10);
    }

    #[test]
    fn year_tokens() {
        assert!(is_year_token(&t(" 1990 ")));
        assert!(is_year_token(&n(2024.0)));
        assert!(!is_year_token(&t("1990M01")));
        assert!(!is_year_token(&n(290.5)));
        assert!(!is_year_token(&Cell::Empty));
    }
}
