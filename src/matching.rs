//! Cross-dataset establishment matching: two exact-key join strategies,
//! union, and composite-identifier dedup.

use anyhow::Result;
use log::{info, warn};
use polars::prelude::*;

use crate::config::MatchOptions;
use crate::table;

pub const NAME_KEY: &str = "name_clean";
pub const ZIP_KEY: &str = "zip_clean";
pub const ADDRESS_KEY: &str = "address_clean";

const KEY_COLUMNS: &[&str] = &[NAME_KEY, ZIP_KEY, ADDRESS_KEY];

/// Join inspections to listings by exact name+ZIP match, then by exact
/// address+ZIP match, union both results, and keep one row per
/// (inspection id, listing id) pair.
///
/// Both frames must already carry the three key columns; rows with a null
/// key never participate in the strategy keyed on it. An empty frame on
/// either side yields an empty result.
pub fn match_establishments(
    inspections: &DataFrame,
    listings: &DataFrame,
    options: &MatchOptions,
) -> Result<DataFrame> {
    let listings = suffix_collisions(inspections, listings, &options.suffix)?;

    let by_name = strategy_join(inspections, &listings, &[NAME_KEY, ZIP_KEY], &options.suffix)?;
    info!("name+zip matches: {}", by_name.height());

    let by_address = strategy_join(
        inspections,
        &listings,
        &[ADDRESS_KEY, ZIP_KEY],
        &options.suffix,
    )?;
    info!("address+zip matches: {}", by_address.height());

    let combined = by_name.vstack(&by_address)?;
    let unique = dedup_pairs(&combined, options)?;
    info!("unique matched pairs: {}", unique.height());
    Ok(unique)
}

/// Inner join on `keys`, restricted on both sides to rows where every key
/// is present. Key columns the strategy does not join on are dropped from
/// the listing side, so every strategy emits the same schema and results
/// can be stacked.
fn strategy_join(
    inspections: &DataFrame,
    listings: &DataFrame,
    keys: &[&str],
    suffix: &str,
) -> Result<DataFrame> {
    let left = table::drop_null_rows(inspections, keys)?;

    let mut right = listings.clone();
    for unused in KEY_COLUMNS.iter().filter(|k| !keys.contains(k)) {
        right = right.drop(&format!("{unused}{suffix}"))?;
    }
    let right_keys: Vec<String> = keys.iter().map(|k| format!("{k}{suffix}")).collect();
    let right_key_refs: Vec<&str> = right_keys.iter().map(String::as_str).collect();
    let right = table::drop_null_rows(&right, &right_key_refs)?;

    let joined = left.join(
        &right,
        keys.to_vec(),
        right_key_refs,
        JoinArgs::new(JoinType::Inner),
    )?;
    Ok(joined)
}

/// Rename listing columns that collide with inspection columns. The key
/// columns exist on both sides, so they always end up suffixed.
fn suffix_collisions(
    inspections: &DataFrame,
    listings: &DataFrame,
    suffix: &str,
) -> Result<DataFrame> {
    let left = inspections.get_column_names();
    let mut out = listings.clone();
    for name in listings.get_column_names() {
        if left.contains(&name) {
            out.rename(name, &format!("{name}{suffix}"))?;
        }
    }
    Ok(out)
}

/// First-seen-wins dedup on the identifier pair; whole-row dedup when an
/// identifier column is missing.
fn dedup_pairs(combined: &DataFrame, options: &MatchOptions) -> Result<DataFrame> {
    let names = combined.get_column_names();
    let have_ids = names.contains(&options.inspection_id.as_str())
        && names.contains(&options.listing_id.as_str());
    let unique = if have_ids {
        let subset = [options.inspection_id.clone(), options.listing_id.clone()];
        combined.unique_stable(Some(&subset), UniqueKeepStrategy::First, None)?
    } else {
        warn!(
            "identifier columns {:?} / {:?} not found; deduplicating on full rows",
            options.inspection_id, options.listing_id
        );
        combined.unique_stable(None, UniqueKeepStrategy::First, None)?
    };
    Ok(unique)
}
