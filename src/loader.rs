use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

lazy_static! {
    static ref PLAIN_NUMBER: Regex = Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap();
}

/// One data row of a worksheet.
///
/// Serializes as a flat JSON object keyed by column header, in sheet order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Record {
    /// 1-based spreadsheet row this record was read from
    #[serde(skip)]
    pub sheet_row: usize,

    /// Raw cell text aligned to the header row
    #[serde(skip)]
    pub cells: Vec<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Cell content as display text; `null` and missing columns become empty.
    pub fn text(&self, column: &str) -> String {
        match self.fields.get(column) {
            Some(value) => value_text(value),
            None => String::new(),
        }
    }
}

/// A worksheet converted into records.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    /// Converts raw rows into records.
    ///
    /// Row 0 is the header. Columns listed in `numeric_columns` are coerced
    /// with [`parse_localized_number`]; text that does not parse becomes `null`.
    pub fn from_rows(rows: &[Vec<String>], numeric_columns: &[&str]) -> Table {
        let Some((header_row, data)) = rows.split_first() else {
            return Table::default();
        };

        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(j, cell)| {
                let name = cell.trim();
                if name.is_empty() {
                    format!("col_{}", j)
                } else {
                    name.to_string()
                }
            })
            .collect();

        let numeric: Vec<bool> = headers
            .iter()
            .map(|h| numeric_columns.contains(&h.as_str()))
            .collect();

        let mut records = Vec::with_capacity(data.len());
        for (i, row) in data.iter().enumerate() {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let mut cells = Vec::with_capacity(headers.len());
            let mut fields = Map::new();
            for (j, header) in headers.iter().enumerate() {
                let raw = row.get(j).cloned().unwrap_or_default();
                let trimmed = raw.trim();
                let value = if trimmed.is_empty() {
                    Value::Null
                } else if numeric[j] {
                    parse_localized_number(trimmed).unwrap_or(Value::Null)
                } else {
                    Value::String(trimmed.to_string())
                };
                fields.insert(header.clone(), value);
                cells.push(raw);
            }

            records.push(Record {
                // +1 for the header row, +1 for 1-based numbering
                sheet_row: i + 2,
                cells,
                fields,
            });
        }

        Table { headers, records }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Parses a number written with Turkish or English separators.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use tercih::loader::parse_localized_number;
///
/// assert_eq!(parse_localized_number("1.234,56"), Some(json!(1234.56)));
/// assert_eq!(parse_localized_number("450,5"), Some(json!(450.5)));
/// assert_eq!(parse_localized_number("12.345.678"), Some(json!(12345678)));
/// assert_eq!(parse_localized_number("yok"), None);
/// ```
pub fn parse_localized_number(text: &str) -> Option<Value> {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();

    let last_dot = compact.rfind('.');
    let last_comma = compact.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (None, Some(_)) if compact.matches(',').count() == 1 => compact.replace(',', "."),
        (None, Some(_)) => compact.replace(',', ""),
        (Some(_), None) if compact.matches('.').count() > 1 => compact.replace('.', ""),
        _ => compact,
    };

    if !PLAIN_NUMBER.is_match(&normalized) {
        return None;
    }

    if normalized.contains('.') {
        let float: f64 = normalized.parse().ok()?;
        Number::from_f64(float).map(Value::Number)
    } else {
        let int: i64 = normalized.parse().ok()?;
        Some(Value::Number(int.into()))
    }
}

/// Renders a JSON cell value back into spreadsheet text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
