use crate::collation::{self, fold};
use crate::loader::{Record, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeSet;

// Program worksheet columns
pub const UNIVERSITY: &str = "Üniversite Adı";
pub const PROGRAM_CODE: &str = "Program Kodu";
pub const COUNTRY: &str = "Ülke";
pub const CITY: &str = "Şehir";
pub const GROUP: &str = "Grup";

/// Columns coerced to numbers when loading the program worksheet.
pub const NUMERIC_COLUMNS: [&str; 3] = ["Kontenjan", "2024 Başarı Sırası", "2024 YKS En Küçük Puanı"];

/// Country assumed when the `Ülke` column is missing or blank.
pub const DEFAULT_COUNTRY: &str = "Türkiye";

/// Query-string parameters of the program listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub ulke: Option<String>,
    pub sehir: Option<String>,
    pub grup: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Distinct values offered in the listing's filter drop-downs.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FilterOptions {
    pub ulkeler: Vec<String>,
    pub sehirler: Vec<String>,
    pub gruplar: Vec<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Country of a record, defaulting to Türkiye.
pub fn country(record: &Record) -> String {
    let value = record.text(COUNTRY);
    if value.trim().is_empty() {
        DEFAULT_COUNTRY.to_string()
    } else {
        value
    }
}

/// Filters and sorts the program records of `table`.
pub fn apply(table: &Table, query: &ListingQuery) -> Vec<Record> {
    let search = non_blank(&query.search).map(fold);
    let ulke = non_blank(&query.ulke);
    let sehir = non_blank(&query.sehir);
    let grup = non_blank(&query.grup);

    let mut records: Vec<Record> = table
        .records
        .iter()
        .filter(|r| match &search {
            Some(needle) => fold(&r.text(UNIVERSITY)).contains(needle.as_str()),
            None => true,
        })
        .filter(|r| ulke.is_none_or(|u| country(r) == u))
        .filter(|r| sehir.is_none_or(|s| r.text(CITY) == s))
        .filter(|r| grup.is_none_or(|g| r.text(GROUP) == g))
        .cloned()
        .collect();

    let sort_by = non_blank(&query.sort_by).unwrap_or(UNIVERSITY);
    let descending = query.sort_order.as_deref().map(str::trim) == Some("desc");

    if !table.has_column(sort_by) {
        sort_by_name(&mut records, false);
    } else if sort_by == UNIVERSITY {
        sort_by_name(&mut records, descending);
    } else {
        records.sort_by(|a, b| compare_cells(a.get(sort_by), b.get(sort_by), descending));
    }
    records
}

fn sort_by_name(records: &mut [Record], descending: bool) {
    if descending {
        records.sort_by_cached_key(|r| Reverse(collation::turkish_key(&r.text(UNIVERSITY))));
    } else {
        records.sort_by_cached_key(|r| collation::turkish_key(&r.text(UNIVERSITY)));
    }
}

/// Orders two cells: numbers before text, text in Turkish order, blanks last.
///
/// `descending` flips the order of non-blank values only.
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };

    let ordering = match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => collation::compare(&text_of(a), &text_of(b)),
    };
    if descending { ordering.reverse() } else { ordering }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collects the distinct country, city and group values of `table`.
pub fn filter_options(table: &Table) -> FilterOptions {
    let mut ulkeler = BTreeSet::new();
    let mut sehirler = BTreeSet::new();
    let mut gruplar = BTreeSet::new();

    for record in &table.records {
        ulkeler.insert(country(record));
        for (set, column) in [(&mut sehirler, CITY), (&mut gruplar, GROUP)] {
            let value = record.text(column);
            if !value.trim().is_empty() {
                set.insert(value);
            }
        }
    }

    FilterOptions {
        ulkeler: sorted(ulkeler),
        sehirler: sorted(sehirler),
        gruplar: sorted(gruplar),
    }
}

pub(crate) fn sorted(values: BTreeSet<String>) -> Vec<String> {
    let mut values: Vec<String> = values.into_iter().collect();
    collation::sort_strings(&mut values);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::sample_data;

    fn programs() -> Table {
        let mut rows = sample_data("Programlar", "Ders Planı")
            .remove("Programlar")
            .unwrap();
        rows.push(
            [
                "Çukurova Üniversitesi",
                "101110004",
                "Tıp",
                "Tıp Fakültesi",
                "Adana",
                "MF-3",
                "",
                "",
                "Dolmadı",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        );
        Table::from_rows(&rows, &NUMERIC_COLUMNS)
    }

    fn names(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.text(UNIVERSITY)).collect()
    }

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        let mut q = ListingQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "search" => q.search = v,
                "ulke" => q.ulke = v,
                "sehir" => q.sehir = v,
                "grup" => q.grup = v,
                "sort_by" => q.sort_by = v,
                "sort_order" => q.sort_order = v,
                other => panic!("unknown key {other}"),
            }
        }
        q
    }

    #[test]
    fn default_sort_is_turkish_alphabetical() {
        let result = apply(&programs(), &ListingQuery::default());
        assert_eq!(
            names(&result),
            vec![
                "Ankara Üniversitesi",
                "Çukurova Üniversitesi",
                "İstanbul Üniversitesi",
                "İzmir Üniversitesi",
            ]
        );
    }

    #[test]
    fn name_sort_can_be_descending() {
        let result = apply(&programs(), &query(&[("sort_order", "desc")]));
        assert_eq!(names(&result)[0], "İzmir Üniversitesi");
        assert_eq!(names(&result)[3], "Ankara Üniversitesi");
    }

    #[test]
    fn search_ignores_case_and_turkish_accents() {
        let result = apply(&programs(), &query(&[("search", "ISTANBUL")]));
        assert_eq!(names(&result), vec!["İstanbul Üniversitesi"]);

        let result = apply(&programs(), &query(&[("search", "cukurova")]));
        assert_eq!(names(&result), vec!["Çukurova Üniversitesi"]);
    }

    #[test]
    fn categorical_filters_are_exact() {
        let result = apply(&programs(), &query(&[("grup", "MF-3")]));
        assert_eq!(
            names(&result),
            vec!["Çukurova Üniversitesi", "İstanbul Üniversitesi"]
        );

        let result = apply(&programs(), &query(&[("sehir", "ankara")]));
        assert!(result.is_empty());

        let result = apply(&programs(), &query(&[("ulke", "Türkiye"), ("sehir", "Adana")]));
        assert_eq!(names(&result), vec!["Çukurova Üniversitesi"]);
    }

    #[test]
    fn numeric_sort_keeps_blanks_last_in_both_directions() {
        let asc = apply(&programs(), &query(&[("sort_by", "2024 YKS En Küçük Puanı")]));
        assert_eq!(
            names(&asc),
            vec![
                "İzmir Üniversitesi",
                "Ankara Üniversitesi",
                "İstanbul Üniversitesi",
                "Çukurova Üniversitesi",
            ]
        );

        let desc = apply(
            &programs(),
            &query(&[("sort_by", "2024 YKS En Küçük Puanı"), ("sort_order", "desc")]),
        );
        assert_eq!(
            names(&desc),
            vec![
                "İstanbul Üniversitesi",
                "Ankara Üniversitesi",
                "İzmir Üniversitesi",
                "Çukurova Üniversitesi",
            ]
        );
    }

    #[test]
    fn descending_name_sort_keeps_sheet_order_within_a_university() {
        let rows: Vec<Vec<String>> = [
            ["Üniversite Adı", "Program Kodu"],
            ["Ege Üniversitesi", "1"],
            ["Ankara Üniversitesi", "9"],
            ["Ege Üniversitesi", "2"],
            ["Ege Üniversitesi", "3"],
        ]
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();
        let table = Table::from_rows(&rows, &NUMERIC_COLUMNS);

        let result = apply(&table, &query(&[("sort_order", "desc")]));
        let codes: Vec<String> = result.iter().map(|r| r.text(PROGRAM_CODE)).collect();
        assert_eq!(codes, vec!["1", "2", "3", "9"]);
    }

    #[test]
    fn unknown_sort_column_falls_back_to_ascending_name() {
        let result = apply(
            &programs(),
            &query(&[("sort_by", "Yok"), ("sort_order", "desc")]),
        );
        assert_eq!(names(&result)[0], "Ankara Üniversitesi");
    }

    #[test]
    fn text_columns_sort_in_turkish_order() {
        let result = apply(&programs(), &query(&[("sort_by", "Şehir")]));
        let cities: Vec<String> = result.iter().map(|r| r.text(CITY)).collect();
        assert_eq!(cities, vec!["Adana", "Ankara", "İstanbul", "İzmir"]);
    }

    #[test]
    fn filter_options_are_distinct_and_collated() {
        let options = filter_options(&programs());
        assert_eq!(options.ulkeler, vec!["Türkiye"]);
        assert_eq!(options.sehirler, vec!["Adana", "Ankara", "İstanbul", "İzmir"]);
        assert_eq!(options.gruplar, vec!["MF-3", "MF-4", "TM-2"]);
    }

    #[test]
    fn numbers_sort_before_text() {
        let n = serde_json::json!(5);
        let s = serde_json::json!("beş");
        assert_eq!(compare_cells(Some(&n), Some(&s), false), Ordering::Less);
        assert_eq!(compare_cells(Some(&n), Some(&s), true), Ordering::Greater);
        assert_eq!(compare_cells(None, Some(&s), true), Ordering::Greater);
    }
}
