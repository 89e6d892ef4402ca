use crate::error::AppError;
use crate::listing::{NUMERIC_COLUMNS, PROGRAM_CODE};
use crate::loader::{Record, Table, value_text};
use crate::source::{DataSource, Origin, RowEdit};
use log::{info, warn};
use serde_json::{Map, Value};

pub const PROGRAM_NOT_FOUND: &str = "Üniversite bulunamadı";

/// Reads the program worksheet.
pub async fn load(source: &DataSource, worksheet: &str) -> Result<(Origin, Table), AppError> {
    let snapshot = source.read(worksheet).await?;
    let table = Table::from_rows(&snapshot.rows, &NUMERIC_COLUMNS);
    Ok((snapshot.origin, table))
}

/// Finds a program by code, comparing trimmed text.
pub fn find<'t>(table: &'t Table, program_code: &str) -> Option<&'t Record> {
    let wanted = program_code.trim();
    table
        .records
        .iter()
        .find(|r| r.text(PROGRAM_CODE).trim() == wanted)
}

/// Appends a new program row built from the JSON object `fields`.
pub async fn create(source: &DataSource, worksheet: &str, fields: &Value) -> Result<Record, AppError> {
    let fields = as_object(fields)?;
    let (origin, table) = load(source, worksheet).await?;
    ensure_writable(source, origin)?;
    if table.headers.is_empty() {
        return Err(AppError::BadRequest(
            "Çalışma sayfasında başlık satırı yok".to_string(),
        ));
    }

    let code = field_code(fields)
        .ok_or_else(|| AppError::BadRequest(format!("'{}' alanı zorunludur", PROGRAM_CODE)))?;
    if find(&table, &code).is_some() {
        return Err(AppError::Conflict(format!("Program kodu zaten kayıtlı: {}", code)));
    }

    let cells = merge_cells(&table.headers, &[], fields);
    source
        .write(worksheet, RowEdit::Append(cells.clone()))
        .await?;
    info!("Created program {} in '{}'", code, worksheet);

    let sheet_row = table.records.last().map_or(2, |r| r.sheet_row + 1);
    Ok(stored_record(&table.headers, cells, sheet_row))
}

/// Merges `fields` onto the row of `program_code` and writes it back.
pub async fn update(
    source: &DataSource,
    worksheet: &str,
    program_code: &str,
    fields: &Value,
) -> Result<Record, AppError> {
    let fields = as_object(fields)?;
    let (origin, table) = load(source, worksheet).await?;
    ensure_writable(source, origin)?;

    let existing = find(&table, program_code)
        .ok_or_else(|| AppError::NotFound(PROGRAM_NOT_FOUND.to_string()))?;

    if let Some(new_code) = field_code(fields) {
        let clash = find(&table, &new_code).is_some_and(|r| r.sheet_row != existing.sheet_row);
        if clash {
            return Err(AppError::Conflict(format!(
                "Program kodu zaten kayıtlı: {}",
                new_code
            )));
        }
    }

    let cells = merge_cells(&table.headers, &existing.cells, fields);
    source
        .write(worksheet, RowEdit::Update(existing.sheet_row, cells.clone()))
        .await?;
    info!(
        "Updated program {} (row {}) in '{}'",
        program_code.trim(),
        existing.sheet_row,
        worksheet
    );

    Ok(stored_record(&table.headers, cells, existing.sheet_row))
}

/// Removes the row of `program_code`.
pub async fn delete(source: &DataSource, worksheet: &str, program_code: &str) -> Result<(), AppError> {
    let (origin, table) = load(source, worksheet).await?;
    ensure_writable(source, origin)?;

    let existing = find(&table, program_code)
        .ok_or_else(|| AppError::NotFound(PROGRAM_NOT_FOUND.to_string()))?;
    source
        .write(worksheet, RowEdit::Delete(existing.sheet_row))
        .await?;
    info!(
        "Deleted program {} (row {}) from '{}'",
        program_code.trim(),
        existing.sheet_row,
        worksheet
    );
    Ok(())
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, AppError> {
    value
        .as_object()
        .ok_or_else(|| AppError::BadRequest("JSON nesnesi bekleniyor".to_string()))
}

fn field_code(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get(PROGRAM_CODE)
        .map(value_text)
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

/// A fallback snapshot cannot be written through to the primary backend.
fn ensure_writable(source: &DataSource, origin: Origin) -> Result<(), AppError> {
    if origin == source.primary() {
        Ok(())
    } else {
        warn!(
            "Refusing write: data was read from {:?} but writes go to {:?}",
            origin,
            source.primary()
        );
        Err(AppError::Unavailable(
            "Veri kaynağına şu anda yazılamıyor".to_string(),
        ))
    }
}

fn merge_cells(headers: &[String], current: &[String], fields: &Map<String, Value>) -> Vec<String> {
    for key in fields.keys() {
        if !headers.contains(key) {
            warn!("Ignoring unknown column '{}'", key);
        }
    }

    headers
        .iter()
        .enumerate()
        .map(|(j, header)| match fields.get(header) {
            Some(value) => value_text(value),
            None => current.get(j).cloned().unwrap_or_default(),
        })
        .collect()
}

fn stored_record(headers: &[String], cells: Vec<String>, sheet_row: usize) -> Record {
    let rows = [headers.to_vec(), cells];
    let mut record = Table::from_rows(&rows, &NUMERIC_COLUMNS)
        .records
        .pop()
        .unwrap_or_else(|| Record {
            sheet_row,
            cells: Vec::new(),
            fields: headers.iter().map(|h| (h.clone(), Value::Null)).collect(),
        });
    record.sheet_row = sheet_row;
    record
}
