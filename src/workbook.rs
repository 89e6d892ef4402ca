use calamine::{Data, Reader, open_workbook_auto};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref CANONICAL_NUMBER: Regex = Regex::new(r"^-?(0|[1-9]\d*)(\.\d+)?$").unwrap();
}

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to open workbook: {0}")]
    Open(#[from] calamine::Error),
    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("workbook io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),
    #[error("workbook has no sheets")]
    Empty,
    #[error("cell at row {row}, column {col} is outside the worksheet")]
    CellOutOfRange { row: usize, col: usize },
}

/// A worksheet as raw text rows, named.
pub type NamedSheet = (String, Vec<Vec<String>>);

/// Local spreadsheet file used when Google Sheets is unavailable.
#[derive(Debug, Clone)]
pub struct Workbook {
    path: PathBuf,
}

impl Workbook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Workbook { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads one worksheet.
    ///
    /// With `first_sheet_fallback`, a missing worksheet name falls back to the
    /// first sheet of the file.
    pub fn read_sheet(
        &self,
        worksheet: &str,
        first_sheet_fallback: bool,
    ) -> Result<Vec<Vec<String>>, WorkbookError> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let names = workbook.sheet_names();

        let name = if names.iter().any(|n| n == worksheet) {
            worksheet.to_string()
        } else if first_sheet_fallback {
            names.first().cloned().ok_or(WorkbookError::Empty)?
        } else {
            return Err(WorkbookError::WorksheetNotFound(worksheet.to_string()));
        };

        let range = workbook.worksheet_range(&name)?;
        Ok(range_rows(&range))
    }

    /// Reads every worksheet, in file order.
    pub fn read_all(&self) -> Result<Vec<NamedSheet>, WorkbookError> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            sheets.push((name, range_rows(&range)));
        }
        Ok(sheets)
    }

    /// Replaces the file with the given sheets.
    ///
    /// The workbook is rendered to memory, written to a temp file beside the
    /// target and then moved over it. Cell formatting is not preserved.
    pub fn write_all(&self, sheets: &[NamedSheet]) -> Result<(), WorkbookError> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name)?;
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    if cell.is_empty() {
                        continue;
                    }
                    let (Ok(r), Ok(c)) = (u32::try_from(r), u16::try_from(c)) else {
                        return Err(WorkbookError::CellOutOfRange { row: r, col: c });
                    };
                    match numeric_cell(cell) {
                        Some(number) => worksheet.write_number(r, c, number)?,
                        None => worksheet.write_string(r, c, cell)?,
                    };
                }
            }
        }
        let buffer = workbook.save_to_buffer()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&buffer)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn range_rows(range: &calamine::Range<Data>) -> Vec<Vec<String>> {
    // calamine ranges start at the first used cell; pad back to A1
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_to_string));
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        rows.push(cells);
    }
    rows
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::String(s) => s.clone(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("ERR:{:?}", e),
        Data::Empty => String::new(),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn numeric_cell(cell: &str) -> Option<f64> {
    if !CANONICAL_NUMBER.is_match(cell) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|f| f.is_finite())
}
