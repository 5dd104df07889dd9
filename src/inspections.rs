//! Municipal inspection table: cleaning, latest-visit reduction, and
//! match-key derivation.

use std::path::Path;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use polars::prelude::*;

use crate::matching::{ADDRESS_KEY, NAME_KEY, ZIP_KEY};
use crate::normalize;
use crate::table;

pub const ID: &str = "CAMIS";
pub const DATE: &str = "INSPECTION_DATE";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Columns kept in the per-restaurant table, in output order.
const KEEP: &[&str] = &[
    "CAMIS",
    "DBA",
    "BORO",
    "BUILDING",
    "STREET",
    "ZIPCODE",
    "CUISINE_DESCRIPTION",
    "INSPECTION_DATE",
    "SCORE",
    "GRADE",
    "HIGH_RISK",
    "LATITUDE",
    "LONGITUDE",
];

/// Load the raw inspection CSV. ZIP and building numbers stay strings.
pub fn load(path: &Path) -> Result<DataFrame> {
    table::read_csv(path, &["ZIPCODE", "BUILDING"])
}

/// Standardize headers, coerce dates, normalize grades, label risk.
///
/// Rows without a parseable inspection date or without a grade are
/// dropped. Dates become ISO `%Y-%m-%d` strings so that text order is
/// date order.
pub fn clean(df: &DataFrame) -> Result<DataFrame> {
    let mut df = standardize_columns(df)?;

    let dates = table::str_column(&df, DATE)?;
    let parsed: Vec<Option<String>> = dates
        .iter()
        .map(|v| v.as_deref().and_then(parse_date))
        .collect();
    df.with_column(Series::new(DATE, parsed))?;
    let before = df.height();
    let mut df = table::drop_null_rows(&df, &[DATE])?;
    info!(
        "dropped {} rows without a parseable inspection date",
        before - df.height()
    );

    let grades: Vec<Option<String>> = table::str_column(&df, "GRADE")?
        .iter()
        .map(|g| {
            g.as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
        .collect();
    df.with_column(Series::new("GRADE", grades))?;
    let mut df = table::drop_null_rows(&df, &["GRADE"])?;

    // 0 for an A grade, 1 for everything else.
    let risk: Vec<i64> = table::str_column(&df, "GRADE")?
        .iter()
        .map(|g| i64::from(g.as_deref() != Some("A")))
        .collect();
    df.with_column(Series::new("HIGH_RISK", risk))?;
    Ok(df)
}

/// One row per establishment: the most recent inspection wins; date ties
/// fall to the later row after the stable sort.
pub fn latest_per_restaurant(df: &DataFrame) -> Result<DataFrame> {
    let sorted = df.sort(vec![ID, DATE], vec![false, false], true)?;
    let subset = [ID.to_string()];
    let latest = sorted.unique_stable(Some(&subset), UniqueKeepStrategy::Last, None)?;

    let names = latest.get_column_names();
    let keep: Vec<&str> = KEEP.iter().copied().filter(|c| names.contains(c)).collect();
    let mut latest = latest.select(keep)?;

    let full = full_address(&latest)?;
    latest.with_column(Series::new("FULL_ADDRESS", full))?;
    Ok(latest)
}

/// Keep only the given borough.
pub fn filter_borough(df: &DataFrame, borough: &str) -> Result<DataFrame> {
    let boros = table::str_column(df, "BORO")?;
    let mask: BooleanChunked = boros
        .iter()
        .map(|b| Some(b.as_deref() == Some(borough)))
        .collect();
    Ok(df.filter(&mask)?)
}

/// Derive the three match-key columns from DBA, ZIPCODE, and
/// BUILDING + STREET.
pub fn with_match_keys(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();

    let names = table::str_column(df, "DBA")?;
    let name_keys: Vec<Option<String>> = names
        .iter()
        .map(|v| v.as_deref().and_then(normalize::name_key))
        .collect();
    out.with_column(Series::new(NAME_KEY, name_keys))?;

    let zips = table::str_column(df, "ZIPCODE")?;
    let zip_keys: Vec<Option<String>> = zips
        .iter()
        .map(|v| v.as_deref().and_then(normalize::zip_key))
        .collect();
    out.with_column(Series::new(ZIP_KEY, zip_keys))?;

    let buildings = table::str_column(df, "BUILDING")?;
    let streets = table::str_column(df, "STREET")?;
    let address_keys: Vec<Option<String>> = buildings
        .iter()
        .zip(&streets)
        .map(|(b, s)| normalize::address_key(b.as_deref(), s.as_deref()))
        .collect();
    out.with_column(Series::new(ADDRESS_KEY, address_keys))?;

    Ok(out)
}

fn standardize_columns(df: &DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.trim().to_ascii_uppercase().replace(' ', "_"))
        .collect();
    let mut out = df.clone();
    out.set_column_names(&names)?;
    Ok(out)
}

fn parse_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date().format("%Y-%m-%d").to_string());
        }
    }
    None
}

fn full_address(df: &DataFrame) -> Result<Vec<Option<String>>> {
    let buildings = table::str_column(df, "BUILDING")?;
    let streets = table::str_column(df, "STREET")?;
    let zips = table::str_column(df, "ZIPCODE")?;
    Ok(buildings
        .iter()
        .zip(&streets)
        .zip(&zips)
        .map(|((b, s), z)| {
            Some(format!(
                "{} {}, NY {}",
                b.as_deref().unwrap_or("").trim(),
                s.as_deref().unwrap_or("").trim(),
                z.as_deref().unwrap_or("").trim()
            ))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_standardizes_parses_and_labels() {
        let df = df!(
            "Camis" => [1i64, 2, 3, 4],
            "Inspection Date" => ["06/01/2023", "bogus", "2023-01-15", "01/15/2023"],
            "Grade" => [Some(" A "), Some("B"), None, Some("C")],
        )
        .unwrap();
        let out = clean(&df).unwrap();
        // Row 2 loses its date, row 3 its grade.
        assert_eq!(out.height(), 2);
        assert_eq!(
            out.column(DATE).unwrap().utf8().unwrap().get(0),
            Some("2023-06-01")
        );
        assert_eq!(out.column("GRADE").unwrap().utf8().unwrap().get(0), Some("A"));
        assert_eq!(out.column("HIGH_RISK").unwrap().i64().unwrap().get(0), Some(0));
        assert_eq!(out.column("HIGH_RISK").unwrap().i64().unwrap().get(1), Some(1));
    }

    #[test]
    fn latest_per_restaurant_takes_max_date() {
        let df = df!(
            "CAMIS" => [5i64, 5, 5],
            "DBA" => ["X", "X", "X"],
            "BORO" => ["Manhattan", "Manhattan", "Manhattan"],
            "BUILDING" => ["1", "1", "1"],
            "STREET" => ["MAIN ST", "MAIN ST", "MAIN ST"],
            "ZIPCODE" => ["10001", "10001", "10001"],
            "INSPECTION_DATE" => ["2023-01-01", "2023-06-01", "2022-12-01"],
            "GRADE" => ["B", "A", "C"],
        )
        .unwrap();
        let latest = latest_per_restaurant(&df).unwrap();
        assert_eq!(latest.height(), 1);
        assert_eq!(
            latest.column(DATE).unwrap().utf8().unwrap().get(0),
            Some("2023-06-01")
        );
        assert_eq!(latest.column("GRADE").unwrap().utf8().unwrap().get(0), Some("A"));
        assert_eq!(
            latest.column("FULL_ADDRESS").unwrap().utf8().unwrap().get(0),
            Some("1 MAIN ST, NY 10001")
        );
    }

    #[test]
    fn latest_reduction_keeps_one_row_per_establishment() {
        let df = df!(
            "CAMIS" => [1i64, 2, 1, 2],
            "DBA" => ["A", "B", "A", "B"],
            "BUILDING" => ["1", "2", "1", "2"],
            "STREET" => ["FIRST ST", "SECOND ST", "FIRST ST", "SECOND ST"],
            "ZIPCODE" => ["10001", "10002", "10001", "10002"],
            "INSPECTION_DATE" => ["2023-01-01", "2023-02-01", "2023-03-01", "2023-01-15"],
            "GRADE" => ["B", "A", "A", "B"],
        )
        .unwrap();
        let latest = latest_per_restaurant(&df).unwrap();
        assert_eq!(latest.height(), 2);
        let grades: Vec<Option<&str>> = latest
            .column("GRADE")
            .unwrap()
            .utf8()
            .unwrap()
            .into_iter()
            .collect();
        assert!(grades.contains(&Some("A")));
    }

    #[test]
    fn filter_borough_keeps_only_that_borough() {
        let df = df!(
            "CAMIS" => [1i64, 2, 3],
            "BORO" => [Some("Manhattan"), Some("Queens"), None],
        )
        .unwrap();
        let kept = filter_borough(&df, "Manhattan").unwrap();
        assert_eq!(kept.height(), 1);
        assert_eq!(kept.column("CAMIS").unwrap().i64().unwrap().get(0), Some(1));
    }

    #[test]
    fn match_keys_absent_for_missing_fields() {
        let df = df!(
            "CAMIS" => [1i64, 2],
            "DBA" => [Some("Joe's Pizza"), None],
            "BUILDING" => [Some("7"), None],
            "STREET" => [Some("Carmine St"), None],
            "ZIPCODE" => [Some("10012-1234"), Some("abc")],
        )
        .unwrap();
        let keyed = with_match_keys(&df).unwrap();
        assert_eq!(
            keyed.column(NAME_KEY).unwrap().utf8().unwrap().get(0),
            Some("JOES PIZZA")
        );
        assert_eq!(
            keyed.column(ZIP_KEY).unwrap().utf8().unwrap().get(0),
            Some("10012")
        );
        assert_eq!(
            keyed.column(ADDRESS_KEY).unwrap().utf8().unwrap().get(0),
            Some("7 CARMINE ST")
        );
        assert_eq!(keyed.column(NAME_KEY).unwrap().utf8().unwrap().get(1), None);
        assert_eq!(keyed.column(ZIP_KEY).unwrap().utf8().unwrap().get(1), None);
        assert_eq!(keyed.column(ADDRESS_KEY).unwrap().utf8().unwrap().get(1), None);
    }

    #[test]
    fn dates_parse_across_formats() {
        assert_eq!(parse_date("06/01/2023"), Some("2023-06-01".to_string()));
        assert_eq!(parse_date("2023-06-01"), Some("2023-06-01".to_string()));
        assert_eq!(
            parse_date("2023-06-01T00:00:00"),
            Some("2023-06-01".to_string())
        );
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }
}
