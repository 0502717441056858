//! Class legends read from spreadsheets or delimited text.
//!
//! A legend is a table with (at least) a `Class_ID` and a `Color` column.
//! Header matching ignores case and surrounding whitespace; other columns
//! are ignored.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::color::Rgb;
use crate::error::{ColormapError, Result};

const CLASS_COLUMN: &str = "Class_ID";
const COLOR_COLUMN: &str = "Color";

/// One legend row: a class ID and its display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub class_id: i32,
    pub color: Rgb,
}

/// Mapping from class ID to display color.
///
/// Class IDs are expected to be unique. When one repeats, the last row wins
/// and the ID is recorded in [`Legend::duplicates`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Legend {
    entries: BTreeMap<i32, Rgb>,
    duplicates: Vec<i32>,
}

impl Legend {
    /// Build a legend from entries, later entries overriding earlier ones.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LegendEntry>,
    {
        let mut legend = Legend::default();
        for entry in entries {
            legend.insert(entry);
        }
        legend
    }

    fn insert(&mut self, entry: LegendEntry) {
        if self.entries.insert(entry.class_id, entry.color).is_some()
            && !self.duplicates.contains(&entry.class_id)
        {
            self.duplicates.push(entry.class_id);
        }
    }

    /// Read a legend file, choosing the parser from the file extension.
    ///
    /// - `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`: first worksheet
    /// - `.csv`: comma separated
    /// - `.tsv`, `.txt`: tab separated
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::from_spreadsheet(path),
            "csv" => Self::from_delimited(std::fs::File::open(path)?, b','),
            "tsv" | "txt" => Self::from_delimited(std::fs::File::open(path)?, b'\t'),
            _ => Err(ColormapError::UnsupportedLegendFormat(path.to_path_buf())),
        }
    }

    /// Read the first worksheet of a workbook.
    pub fn from_spreadsheet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook = open_workbook_auto(path.as_ref())?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ColormapError::Spreadsheet("workbook has no worksheets".into()))??;

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        Self::from_rows(rows)
    }

    /// Read delimited text with a header row.
    pub fn from_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            rows.push(record?.iter().map(str::to_string).collect::<Vec<_>>());
        }
        Self::from_rows(rows)
    }

    /// Build a legend from a header row followed by data rows.
    ///
    /// Blank leading rows are skipped; the first non-blank row is the header.
    /// Rows where both the class and color cells are blank are skipped too.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i + 1, row))
            .skip_while(|(_, row)| row.iter().all(|c| c.trim().is_empty()));

        let (_, header) = rows.next().ok_or(ColormapError::EmptyLegend)?;
        let class_col = find_column(&header, CLASS_COLUMN)?;
        let color_col = find_column(&header, COLOR_COLUMN)?;

        let mut legend = Legend::default();
        for (row_number, row) in rows {
            let class_cell = row.get(class_col).map(|s| s.trim()).unwrap_or("");
            let color_cell = row.get(color_col).map(|s| s.trim()).unwrap_or("");
            if class_cell.is_empty() && color_cell.is_empty() {
                continue;
            }

            let entry = parse_entry(class_cell, color_cell).map_err(|e| e.at_row(row_number))?;
            legend.insert(entry);
        }

        if legend.is_empty() {
            return Err(ColormapError::EmptyLegend);
        }
        Ok(legend)
    }

    /// Color declared for a class.
    pub fn get(&self, class_id: i32) -> Option<Rgb> {
        self.entries.get(&class_id).copied()
    }

    /// Entries in ascending class order.
    pub fn iter(&self) -> impl Iterator<Item = LegendEntry> + '_ {
        self.entries
            .iter()
            .map(|(&class_id, &color)| LegendEntry { class_id, color })
    }

    /// Number of distinct classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Class IDs that appeared more than once, in order of first repetition.
    pub fn duplicates(&self) -> &[i32] {
        &self.duplicates
    }
}

fn find_column(header: &[String], name: &'static str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or(ColormapError::MissingColumn(name))
}

fn parse_entry(class_cell: &str, color_cell: &str) -> Result<LegendEntry> {
    let class_id = parse_class_id(class_cell)?;
    let color = color_cell.parse::<Rgb>()?;
    Ok(LegendEntry { class_id, color })
}

/// Integer class IDs, also accepting integral floats (`3.0`) as spreadsheets store them.
fn parse_class_id(cell: &str) -> Result<i32> {
    if let Ok(id) = cell.parse::<i32>() {
        return Ok(id);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(ColormapError::InvalidClassId(cell.to_string())),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn reads_csv_legend() {
        let text = "Class_ID,Color,Name\n1,#FF0000,Forest\n2,#00ff00,Crops\n";
        let legend = Legend::from_delimited(text.as_bytes(), b',').unwrap();

        assert_eq!(legend.len(), 2);
        assert_eq!(legend.get(1), Some(Rgb::new(255, 0, 0)));
        assert_eq!(legend.get(2), Some(Rgb::new(0, 255, 0)));
        assert_eq!(legend.get(3), None);
    }

    #[test]
    fn header_match_is_case_insensitive_and_column_order_free() {
        let legend = Legend::from_rows(rows(&[
            &["", ""],
            &[" color ", "CLASS_ID"],
            &["#0000FF", "7"],
        ]))
        .unwrap();
        assert_eq!(legend.get(7), Some(Rgb::new(0, 0, 255)));
    }

    #[test]
    fn spreadsheet_floats_are_class_ids() {
        let legend = Legend::from_rows(rows(&[&["Class_ID", "Color"], &["3", "#010203"], &["4.0", "#040506"]]))
            .unwrap();
        assert_eq!(legend.iter().map(|e| e.class_id).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn fractional_class_id_rejected_with_row() {
        let err = Legend::from_rows(rows(&[&["Class_ID", "Color"], &["1", "#000000"], &["2.5", "#FFFFFF"]]))
            .unwrap_err();
        match err {
            ColormapError::Row { row, source } => {
                assert_eq!(row, 3);
                assert!(matches!(*source, ColormapError::InvalidClassId(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bad_color_rejected() {
        let err = Legend::from_rows(rows(&[&["Class_ID", "Color"], &["1", "#12345"]])).unwrap_err();
        assert!(matches!(err, ColormapError::Row { row: 2, .. }));
    }

    #[test]
    fn missing_column_reported() {
        let err = Legend::from_rows(rows(&[&["Class", "Color"], &["1", "#000000"]])).unwrap_err();
        assert!(matches!(err, ColormapError::MissingColumn("Class_ID")));
    }

    #[test]
    fn empty_legend_rejected() {
        let err = Legend::from_rows(rows(&[&["Class_ID", "Color"], &["", ""]])).unwrap_err();
        assert!(matches!(err, ColormapError::EmptyLegend));
        assert!(matches!(Legend::from_rows(Vec::new()), Err(ColormapError::EmptyLegend)));
    }

    #[test]
    fn duplicates_last_wins() {
        let legend = Legend::from_rows(rows(&[
            &["Class_ID", "Color"],
            &["1", "#000000"],
            &["1", "#FFFFFF"],
            &["1", "#808080"],
        ]))
        .unwrap();
        assert_eq!(legend.get(1), Some(Rgb::new(128, 128, 128)));
        assert_eq!(legend.duplicates(), &[1]);
    }

    #[test]
    fn from_path_dispatches_on_extension() {
        let mut tsv = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(tsv, "Class_ID\tColor\n5\t#ABCDEF").unwrap();
        let legend = Legend::from_path(tsv.path()).unwrap();
        assert_eq!(legend.get(5), Some(Rgb::new(0xAB, 0xCD, 0xEF)));

        let other = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        assert!(matches!(
            Legend::from_path(other.path()),
            Err(ColormapError::UnsupportedLegendFormat(_))
        ));
    }
}
