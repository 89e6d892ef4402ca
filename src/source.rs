use crate::config::Config;
use crate::sheets::{SheetsClient, SheetsError};
use crate::workbook::{Workbook, WorkbookError};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Sheets(#[from] SheetsError),
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),
    #[error("row {0} is outside the worksheet")]
    RowOutOfRange(usize),
    #[error("background task failed: {0}")]
    Task(String),
}

/// Which backend produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Origin {
    #[serde(rename = "Google Sheets")]
    GoogleSheets,
    #[serde(rename = "Excel File")]
    ExcelFile,
    #[serde(rename = "Sample Data")]
    SampleData,
}

/// Raw rows of one worksheet together with where they came from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub origin: Origin,
    pub rows: Vec<Vec<String>>,
}

/// A single-row change to a worksheet.
#[derive(Debug, Clone)]
pub enum RowEdit {
    Append(Vec<String>),
    /// Overwrite the 1-based spreadsheet row
    Update(usize, Vec<String>),
    /// Remove the 1-based spreadsheet row
    Delete(usize),
}

impl RowEdit {
    fn apply(self, rows: &mut Vec<Vec<String>>) -> Result<(), SourceError> {
        match self {
            RowEdit::Append(cells) => rows.push(cells),
            RowEdit::Update(sheet_row, cells) => {
                let slot = sheet_row
                    .checked_sub(1)
                    .and_then(|i| rows.get_mut(i))
                    .ok_or(SourceError::RowOutOfRange(sheet_row))?;
                *slot = cells;
            }
            RowEdit::Delete(sheet_row) => {
                match sheet_row.checked_sub(1) {
                    Some(i) if i < rows.len() => {
                        rows.remove(i);
                    }
                    _ => return Err(SourceError::RowOutOfRange(sheet_row)),
                }
            }
        }
        Ok(())
    }
}

/// Spreadsheet-backed storage with fallbacks.
///
/// Reads try Google Sheets, then the local workbook, then built-in sample
/// data. Writes only go to the primary backend: the first one configured.
#[derive(Debug)]
pub struct DataSource {
    sheets: Option<SheetsClient>,
    workbook: Option<Workbook>,
    /// worksheet name → rows; the last-resort backend
    memory: RwLock<HashMap<String, Vec<Vec<String>>>>,
    program_worksheet: String,
}

impl DataSource {
    pub fn new(
        sheets: Option<SheetsClient>,
        workbook: Option<Workbook>,
        memory: HashMap<String, Vec<Vec<String>>>,
        program_worksheet: impl Into<String>,
    ) -> Self {
        DataSource {
            sheets,
            workbook,
            memory: RwLock::new(memory),
            program_worksheet: program_worksheet.into(),
        }
    }

    /// Builds the backend chain described by `config`, seeding memory with sample data.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let sheets = match config.sheets_auth() {
            Some((id, auth)) => Some(SheetsClient::new(id, auth, config.sheets_timeout)?),
            None => None,
        };
        let workbook = Workbook::new(&config.local_workbook);
        let workbook = if workbook.exists() {
            Some(workbook)
        } else {
            info!("Local workbook {} not found", config.local_workbook.display());
            None
        };

        let memory = sample_data(&config.program_worksheet, &config.course_plan_worksheet);
        Ok(DataSource::new(
            sheets,
            workbook,
            memory,
            config.program_worksheet.clone(),
        ))
    }

    /// A source backed only by the given in-memory worksheets.
    pub fn in_memory(
        worksheets: HashMap<String, Vec<Vec<String>>>,
        program_worksheet: impl Into<String>,
    ) -> Self {
        DataSource::new(None, None, worksheets, program_worksheet)
    }

    pub fn sheets_configured(&self) -> bool {
        self.sheets.is_some()
    }

    pub fn sheets(&self) -> Option<&SheetsClient> {
        self.sheets.as_ref()
    }

    /// The backend that receives writes.
    pub fn primary(&self) -> Origin {
        if self.sheets.is_some() {
            Origin::GoogleSheets
        } else if self.workbook.is_some() {
            Origin::ExcelFile
        } else {
            Origin::SampleData
        }
    }

    pub async fn read(&self, worksheet: &str) -> Result<Snapshot, SourceError> {
        if let Some(sheets) = &self.sheets {
            match sheets.read_rows(worksheet).await {
                Ok(rows) => {
                    return Ok(Snapshot {
                        origin: Origin::GoogleSheets,
                        rows,
                    });
                }
                Err(e) => warn!("Google Sheets read of '{}' failed: {}", worksheet, e),
            }
        }

        if let Some(workbook) = &self.workbook {
            let reader = workbook.clone();
            let name = worksheet.to_string();
            let fallback = worksheet == self.program_worksheet;
            let result = tokio::task::spawn_blocking(move || reader.read_sheet(&name, fallback))
                .await
                .map_err(|e| SourceError::Task(e.to_string()))?;
            match result {
                Ok(rows) => {
                    return Ok(Snapshot {
                        origin: Origin::ExcelFile,
                        rows,
                    });
                }
                Err(e) => warn!(
                    "Workbook read of '{}' from {} failed: {}",
                    worksheet,
                    workbook.path().display(),
                    e
                ),
            }
        }

        let memory = self
            .memory
            .read()
            .map_err(|e| SourceError::Task(e.to_string()))?;
        let rows = memory
            .get(worksheet)
            .cloned()
            .ok_or_else(|| SourceError::WorksheetNotFound(worksheet.to_string()))?;
        Ok(Snapshot {
            origin: Origin::SampleData,
            rows,
        })
    }

    /// Applies `edit` to `worksheet` on the primary backend.
    pub async fn write(&self, worksheet: &str, edit: RowEdit) -> Result<(), SourceError> {
        if let Some(sheets) = &self.sheets {
            match edit {
                RowEdit::Append(cells) => sheets.append_row(worksheet, &cells).await?,
                RowEdit::Update(row, cells) => sheets.update_row(worksheet, row, &cells).await?,
                RowEdit::Delete(row) => sheets.delete_row(worksheet, row).await?,
            }
            return Ok(());
        }

        if let Some(workbook) = &self.workbook {
            let workbook = workbook.clone();
            let name = worksheet.to_string();
            let fallback = worksheet == self.program_worksheet;
            return tokio::task::spawn_blocking(move || edit_workbook(&workbook, &name, fallback, edit))
                .await
                .map_err(|e| SourceError::Task(e.to_string()))?;
        }

        let mut memory = self
            .memory
            .write()
            .map_err(|e| SourceError::Task(e.to_string()))?;
        let rows = memory
            .get_mut(worksheet)
            .ok_or_else(|| SourceError::WorksheetNotFound(worksheet.to_string()))?;
        edit.apply(rows)
    }
}

fn edit_workbook(
    workbook: &Workbook,
    worksheet: &str,
    first_sheet_fallback: bool,
    edit: RowEdit,
) -> Result<(), SourceError> {
    let mut sheets = workbook.read_all()?;
    let index = match sheets.iter().position(|(name, _)| name == worksheet) {
        Some(index) => index,
        None if first_sheet_fallback && !sheets.is_empty() => 0,
        None => return Err(SourceError::WorksheetNotFound(worksheet.to_string())),
    };
    edit.apply(&mut sheets[index].1)?;
    workbook.write_all(&sheets)?;
    Ok(())
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Example rows served when no spreadsheet is reachable.
pub fn sample_data(
    program_worksheet: &str,
    course_plan_worksheet: &str,
) -> HashMap<String, Vec<Vec<String>>> {
    let programs = vec![
        row(&[
            "Üniversite Adı",
            "Program Kodu",
            "Program Adı",
            "Fakülte Adı",
            "Şehir",
            "Grup",
            "Kontenjan",
            "2024 Başarı Sırası",
            "2024 YKS En Küçük Puanı",
        ]),
        row(&[
            "İstanbul Üniversitesi",
            "101110001",
            "Tıp",
            "Tıp Fakültesi",
            "İstanbul",
            "MF-3",
            "100",
            "1500",
            "450,5",
        ]),
        row(&[
            "Ankara Üniversitesi",
            "101110002",
            "Hukuk",
            "Hukuk Fakültesi",
            "Ankara",
            "TM-2",
            "80",
            "2500",
            "420,3",
        ]),
        row(&[
            "İzmir Üniversitesi",
            "101110003",
            "Bilgisayar Mühendisliği",
            "Mühendislik Fakültesi",
            "İzmir",
            "MF-4",
            "120",
            "3000",
            "380,7",
        ]),
    ];

    let course_plan = vec![
        row(&[
            "Üniversite",
            "Fakülte",
            "Bölüm",
            "Dönem",
            "Ders Kodu",
            "Ders Adı",
            "Kredi",
            "AKTS",
        ]),
        row(&[
            "İstanbul Teknik Üniversitesi",
            "Bilgisayar ve Bilişim Fakültesi",
            "Bilgisayar Mühendisliği (İngilizce)",
            "1",
            "BLG101E",
            "Bilgisayar Mühendisliğine Giriş",
            "3",
            "5",
        ]),
        row(&[
            "İstanbul Teknik Üniversitesi",
            "Fen-Edebiyat Fakültesi",
            "Fizik Mühendisliği",
            "1",
            "FIZ101",
            "Fizik I",
            "4",
            "6",
        ]),
        row(&[
            "Ankara Üniversitesi",
            "Hukuk Fakültesi",
            "Hukuk",
            "1",
            "HUK101",
            "Anayasa Hukuku",
            "4",
            "6",
        ]),
        row(&[
            "Ege Üniversitesi",
            "Mühendislik Fakültesi",
            "Bilgisayar Mühendisliği",
            "2",
            "BIL204",
            "Veri Yapıları",
            "3",
            "5",
        ]),
    ];

    HashMap::from([
        (program_worksheet.to_string(), programs),
        (course_plan_worksheet.to_string(), course_plan),
    ])
}
