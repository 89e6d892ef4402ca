use crate::collation;
use crate::error::AppError;
use crate::listing::sorted;
use crate::loader::{Record, Table};
use crate::matching::Matcher;
use crate::source::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Columns coerced to numbers when loading the course-plan worksheet.
pub const NUMERIC_COLUMNS: [&str; 2] = ["Kredi", "AKTS"];

/// A categorical column of the course plan that accepts a fuzzy filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    University,
    Faculty,
    Department,
    Course,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::University,
        Dimension::Faculty,
        Dimension::Department,
        Dimension::Course,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::University => "Üniversite",
            Dimension::Faculty => "Fakülte",
            Dimension::Department => "Bölüm",
            Dimension::Course => "Ders Adı",
        }
    }
}

/// Query-string parameters of the course-plan listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePlanQuery {
    pub universite: Option<String>,
    pub fakulte: Option<String>,
    pub bolum: Option<String>,
    pub ders: Option<String>,
    /// Free text that may match any dimension
    pub search: Option<String>,
}

impl CoursePlanQuery {
    fn filter(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::University => self.universite.as_deref(),
            Dimension::Faculty => self.fakulte.as_deref(),
            Dimension::Department => self.bolum.as_deref(),
            Dimension::Course => self.ders.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CoursePlanOptions {
    pub universiteler: Vec<String>,
    pub fakulteler: Vec<String>,
    pub bolumler: Vec<String>,
    pub dersler: Vec<String>,
}

/// Reads the course-plan worksheet.
pub async fn load(source: &DataSource, worksheet: &str) -> Result<Table, AppError> {
    let snapshot = source.read(worksheet).await?;
    Ok(Table::from_rows(&snapshot.rows, &NUMERIC_COLUMNS))
}

/// Keeps the course-plan rows matching every given filter.
pub fn apply(table: &Table, query: &CoursePlanQuery) -> Vec<Record> {
    let matchers: Vec<(Dimension, Matcher)> = Dimension::ALL
        .iter()
        .map(|&d| (d, Matcher::new(query.filter(d).unwrap_or_default())))
        .filter(|(_, m)| !m.is_blank())
        .collect();
    let search = Matcher::new(query.search.as_deref().unwrap_or_default());

    let mut records: Vec<Record> = table
        .records
        .iter()
        .filter(|r| {
            matchers
                .iter()
                .all(|(d, m)| m.is_match(&r.text(d.column())))
        })
        .filter(|r| {
            search.is_blank()
                || Dimension::ALL
                    .iter()
                    .any(|d| search.is_match(&r.text(d.column())))
        })
        .cloned()
        .collect();

    records.sort_by_cached_key(|r| {
        [
            Dimension::University,
            Dimension::Department,
            Dimension::Course,
        ]
        .map(|d| collation::turkish_key(&r.text(d.column())))
    });
    records
}

/// Collects the distinct values of each dimension.
pub fn options(table: &Table) -> CoursePlanOptions {
    let mut sets: [BTreeSet<String>; 4] = Default::default();
    for record in &table.records {
        for (set, dimension) in sets.iter_mut().zip(Dimension::ALL) {
            let value = record.text(dimension.column());
            if !value.trim().is_empty() {
                set.insert(value);
            }
        }
    }

    let [universiteler, fakulteler, bolumler, dersler] = sets.map(sorted);
    CoursePlanOptions {
        universiteler,
        fakulteler,
        bolumler,
        dersler,
    }
}
