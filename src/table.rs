//! DataFrame file I/O and small diagnostics helpers.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use polars::prelude::*;

/// Read a table, choosing the reader from the file extension. For CSV
/// input the named columns are forced to string so postal codes keep
/// leading zeros and never infer as integers.
pub fn read_table(path: &Path, utf8_columns: &[&str]) -> Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let df = match ext {
        "csv" => read_csv(path, utf8_columns)?,
        "parquet" => ParquetReader::new(open(path)?).finish()?,
        "json" | "ndjson" | "jsonl" => JsonLineReader::new(open(path)?).finish()?,
        other => bail!("unsupported table format {other:?}: {}", path.display()),
    };
    Ok(df)
}

/// Read a CSV with string-dtype overrides for the named columns.
pub fn read_csv(path: &Path, utf8_columns: &[&str]) -> Result<DataFrame> {
    let overrides = Schema::from_iter(
        utf8_columns
            .iter()
            .map(|c| Field::new(c, DataType::Utf8)),
    );
    let df = CsvReader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?
        .has_header(true)
        .infer_schema(Some(10_000))
        .with_ignore_errors(true)
        .with_dtypes(Some(Arc::new(overrides)))
        .finish()?;
    Ok(df)
}

pub fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    ensure_parent(path)?;
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

pub fn write_parquet(path: &Path, df: &mut DataFrame) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    ParquetWriter::new(file).finish(df)?;
    Ok(())
}

/// Write the CSV + Parquet pair sharing `base`'s stem. Returns the two
/// paths written.
pub fn write_outputs(base: &Path, df: &mut DataFrame) -> Result<(PathBuf, PathBuf)> {
    let csv = base.with_extension("csv");
    let parquet = base.with_extension("parquet");
    write_csv(&csv, df)?;
    write_parquet(&parquet, df)?;
    info!(
        "wrote {} rows to {} and {}",
        df.height(),
        csv.display(),
        parquet.display()
    );
    Ok((csv, parquet))
}

/// Column values as owned strings, casting non-string columns first.
pub fn str_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let s = df
        .column(name)
        .with_context(|| format!("missing column {name:?}"))?
        .cast(&DataType::Utf8)?;
    Ok(s.utf8()?.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Rows where every one of `columns` is non-null.
pub fn drop_null_rows(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut mask = df.column(columns[0])?.is_not_null();
    for column in &columns[1..] {
        mask = mask & df.column(column)?.is_not_null();
    }
    Ok(df.filter(&mask)?)
}

/// Log shape, columns, and null counts for the usual key fields.
pub fn summarize(df: &DataFrame, label: &str) {
    info!("{label}: {} rows x {} columns", df.height(), df.width());
    info!("{label} columns: {:?}", df.get_column_names());
    for column in [
        "name",
        "address1",
        "city",
        "state",
        "postal_code",
        "DBA",
        "BORO",
        "BUILDING",
        "STREET",
        "ZIPCODE",
    ] {
        if let Ok(s) = df.column(column) {
            info!("{label}: {} missing values in {column:?}", s.null_count());
        }
    }
}

/// Distinct values of a column with their row counts, most frequent first.
pub fn value_counts(df: &DataFrame, column: &str) -> Result<Vec<(String, usize)>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in str_column(df, column)?.into_iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }
    let mut pairs: Vec<_> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(pairs)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("opening {}", path.display()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
        }
    }
    Ok(())
}
