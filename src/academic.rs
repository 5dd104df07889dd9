//! Listing snapshot from a line-delimited JSON business dump, as an
//! alternative to the live search API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use polars::prelude::*;

use crate::source::BusinessSource;
use crate::table;

/// Columns carried through from the snapshot, when present.
const KEEP: &[&str] = &[
    "business_id",
    "name",
    "address",
    "city",
    "state",
    "postal_code",
    "latitude",
    "longitude",
    "stars",
    "review_count",
    "categories",
    "is_open",
];

/// Reads a local line-delimited JSON business snapshot and keeps the
/// restaurants of one city.
pub struct AcademicSnapshot {
    pub path: PathBuf,
    pub city: String,
    pub state: String,
}

#[async_trait]
impl BusinessSource for AcademicSnapshot {
    async fn businesses(&self) -> Result<DataFrame> {
        let df = table::read_table(&self.path, &[])
            .with_context(|| format!("reading snapshot {}", self.path.display()))?;
        info!("snapshot rows: {}", df.height());
        let df = filter_city_restaurants(&df, &self.city, &self.state)?;
        info!("{} restaurant rows in {}, {}", df.height(), self.city, self.state);
        with_snapshot_columns(&df, &self.city, &self.state)
    }
}

/// Keep rows in the given state and city whose categories mention
/// restaurants or food.
pub fn filter_city_restaurants(df: &DataFrame, city: &str, state: &str) -> Result<DataFrame> {
    let states = table::str_column(df, "state")?;
    let cities = table::str_column(df, "city")?;
    let categories = table::str_column(df, "categories")?;
    let mask: BooleanChunked = states
        .iter()
        .zip(&cities)
        .zip(&categories)
        .map(|((s, c), cats)| {
            let here = s.as_deref() == Some(state) && c.as_deref() == Some(city);
            let food = cats.as_deref().map(is_food_category).unwrap_or(false);
            Some(here && food)
        })
        .collect();
    Ok(df.filter(&mask)?)
}

fn is_food_category(categories: &str) -> bool {
    let lower = categories.to_ascii_lowercase();
    lower.contains("restaurant") || lower.contains("food")
}

/// Restrict to the useful columns and add a display address.
fn with_snapshot_columns(df: &DataFrame, city: &str, state: &str) -> Result<DataFrame> {
    let names = df.get_column_names();
    let keep: Vec<&str> = KEEP.iter().copied().filter(|c| names.contains(c)).collect();
    let mut out = df.select(keep)?;

    let addresses = table::str_column(&out, "address")?;
    let postals = table::str_column(&out, "postal_code")?;
    let full: Vec<Option<String>> = addresses
        .iter()
        .zip(&postals)
        .map(|(a, p)| {
            Some(format!(
                "{}, {city}, {state} {}",
                a.as_deref().unwrap_or("").trim(),
                p.as_deref().unwrap_or("").trim()
            ))
        })
        .collect();
    out.with_column(Series::new("FULL_ADDRESS", full))?;
    Ok(out)
}
