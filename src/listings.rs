//! Listing tables: file loading and match-key derivation.

use std::path::Path;

use anyhow::Result;
use polars::prelude::*;

use crate::config::ListingColumns;
use crate::matching::{ADDRESS_KEY, NAME_KEY, ZIP_KEY};
use crate::normalize;
use crate::table;

/// Load a listing table from CSV or Parquet. Postal codes stay strings.
pub fn load(path: &Path) -> Result<DataFrame> {
    table::read_table(path, &["postal_code"])
}

/// Derive the three match-key columns from the configured listing
/// columns. The address line carries both building number and street, so
/// it feeds the address key whole.
pub fn with_match_keys(df: &DataFrame, columns: &ListingColumns) -> Result<DataFrame> {
    let mut out = df.clone();

    let names = table::str_column(df, &columns.name)?;
    let name_keys: Vec<Option<String>> = names
        .iter()
        .map(|v| v.as_deref().and_then(normalize::name_key))
        .collect();
    out.with_column(Series::new(NAME_KEY, name_keys))?;

    let zips = table::str_column(df, &columns.postal_code)?;
    let zip_keys: Vec<Option<String>> = zips
        .iter()
        .map(|v| v.as_deref().and_then(normalize::zip_key))
        .collect();
    out.with_column(Series::new(ZIP_KEY, zip_keys))?;

    let addresses = table::str_column(df, &columns.address)?;
    let address_keys: Vec<Option<String>> = addresses
        .iter()
        .map(|a| normalize::address_key(None, a.as_deref()))
        .collect();
    out.with_column(Series::new(ADDRESS_KEY, address_keys))?;

    Ok(out)
}
