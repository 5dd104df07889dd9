use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info};

use eatlink::academic::AcademicSnapshot;
use eatlink::config::{ListingColumns, MatchOptions, ScrapeConfig};
use eatlink::scrape::YelpSearch;
use eatlink::source::BusinessSource;
use eatlink::{inspections, listings, matching, table};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else { usage() };
    let flags = parse_flags(&args[2..]);
    match command.as_str() {
        "scrape" => scrape(&flags).await,
        "snapshot" => snapshot(&flags).await,
        "clean" => clean(&flags),
        "join" => join(&flags),
        "inspect" => inspect(&flags),
        _ => usage(),
    }
}

async fn scrape(flags: &Flags) -> Result<()> {
    // The credential is read from the environment exactly once, here, and
    // injected into the scrape config.
    let api_key =
        env::var("YELP_API_KEY").context("YELP_API_KEY environment variable is not set")?;
    let out_dir = PathBuf::from(flags.get("out-dir").unwrap_or("data/processed"));

    let source = YelpSearch::new(ScrapeConfig::manhattan(api_key));
    let mut listings = source.businesses().await?;
    table::write_outputs(&out_dir.join("yelp_nyc_api_businesses"), &mut listings)?;
    Ok(())
}

async fn snapshot(flags: &Flags) -> Result<()> {
    let input = PathBuf::from(flags.require("input")?);
    let city = flags.get("city").unwrap_or("Philadelphia").to_string();
    let state = flags.get("state").unwrap_or("PA").to_string();
    let out_dir = PathBuf::from(flags.get("out-dir").unwrap_or("data/processed"));

    let stem = format!("yelp_{}_businesses", city.to_ascii_lowercase());
    let source = AcademicSnapshot {
        path: input,
        city,
        state,
    };
    let mut businesses = source.businesses().await?;
    table::write_outputs(&out_dir.join(stem), &mut businesses)?;
    Ok(())
}

fn clean(flags: &Flags) -> Result<()> {
    let input = PathBuf::from(flags.require("input")?);
    let out_dir = PathBuf::from(flags.get("out-dir").unwrap_or("data/processed"));

    info!("loading inspections from {}", input.display());
    let raw = inspections::load(&input)?;
    info!("rows loaded: {}", raw.height());

    let mut cleaned = inspections::clean(&raw)?;
    info!("cleaned inspection rows: {}", cleaned.height());
    table::write_parquet(&out_dir.join("inspections_clean.parquet"), &mut cleaned)?;

    let mut latest = inspections::latest_per_restaurant(&cleaned)?;
    info!("unique restaurants: {}", latest.height());
    table::write_parquet(&out_dir.join("restaurants_latest.parquet"), &mut latest)?;
    Ok(())
}

fn join(flags: &Flags) -> Result<()> {
    let inspections_path = PathBuf::from(flags.require("inspections")?);
    let listings_path = PathBuf::from(flags.require("listings")?);
    let out = PathBuf::from(
        flags
            .get("out")
            .unwrap_or("data/processed/inspections_yelp_joined"),
    );

    info!("loading inspections from {}", inspections_path.display());
    let ins = table::read_table(&inspections_path, &["ZIPCODE", "BUILDING"])?;
    info!("inspection rows: {}", ins.height());
    let ins = match flags.get("borough") {
        Some(borough) => {
            let filtered = inspections::filter_borough(&ins, borough)?;
            info!("{borough} rows: {}", filtered.height());
            filtered
        }
        None => ins,
    };
    let ins = inspections::clean(&ins)?;
    let ins = inspections::latest_per_restaurant(&ins)?;
    info!("restaurants to match: {}", ins.height());
    let ins = inspections::with_match_keys(&ins)?;

    info!("loading listings from {}", listings_path.display());
    let lst = listings::load(&listings_path)?;
    info!("listing rows: {}", lst.height());
    let lst = listings::with_match_keys(&lst, &ListingColumns::default())?;

    let mut joined = matching::match_establishments(&ins, &lst, &MatchOptions::default())?;
    table::write_outputs(&out, &mut joined)?;
    Ok(())
}

fn inspect(flags: &Flags) -> Result<()> {
    let ins = table::read_table(
        &PathBuf::from(flags.require("inspections")?),
        &["ZIPCODE", "BUILDING"],
    )?;
    table::summarize(&ins, "inspections");
    if ins.get_column_names().contains(&"BORO") {
        for (borough, count) in table::value_counts(&ins, "BORO")? {
            info!("inspections: BORO {borough:?} x {count}");
        }
    }

    let lst = table::read_table(&PathBuf::from(flags.require("listings")?), &["postal_code"])?;
    table::summarize(&lst, "listings");
    Ok(())
}

struct Flags(HashMap<String, String>);

impl Flags {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .with_context(|| format!("missing required flag --{key}"))
    }
}

fn parse_flags(args: &[String]) -> Flags {
    let mut map = HashMap::new();
    let mut i = 0;
    while i < args.len() {
        let Some(key) = args[i].strip_prefix("--") else {
            usage()
        };
        let Some(value) = args.get(i + 1) else { usage() };
        map.insert(key.to_string(), value.clone());
        i += 2;
    }
    Flags(map)
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  eatlink scrape [--out-dir DIR]");
    eprintln!("  eatlink snapshot --input FILE [--city CITY] [--state ST] [--out-dir DIR]");
    eprintln!("  eatlink clean --input FILE [--out-dir DIR]");
    eprintln!("  eatlink join --inspections FILE --listings FILE [--borough NAME] [--out BASE]");
    eprintln!("  eatlink inspect --inspections FILE --listings FILE");
    eprintln!();
    eprintln!("scrape reads the API credential from YELP_API_KEY.");
    std::process::exit(2);
}
