//! Batch pipeline linking municipal restaurant inspections to scraped
//! business listings.
//!
//! The flow is load -> normalize -> join -> dedup -> write: inspection
//! records are cleaned and reduced to one row per establishment, listings
//! come from the search API or a local snapshot, both sides get derived
//! name/ZIP/address keys, and the matcher unions two exact-key join
//! strategies into a single deduplicated table written as CSV + Parquet.

pub mod academic;
pub mod config;
pub mod inspections;
pub mod listings;
pub mod matching;
pub mod normalize;
pub mod scrape;
pub mod source;
pub mod table;
