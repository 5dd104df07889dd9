//! Listing acquisition from the paginated business-search API.
//!
//! Each (area, term) pair in the configured grid is paged with
//! offset/limit up to the configured maximum offset. A 429 gets one
//! fixed-delay retry; any other HTTP failure abandons the current query
//! and the grid moves on. Results accumulate across the whole grid and
//! are deduplicated by listing id before they become a table.

use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use polars::prelude::*;
use reqwest::StatusCode;
use tokio::time::sleep;
use yelp_api::{Business, SearchResponse};

use crate::config::{Area, ScrapeConfig};
use crate::source::BusinessSource;

pub struct YelpSearch {
    client: reqwest::Client,
    config: ScrapeConfig,
}

impl YelpSearch {
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn fetch_page(
        &self,
        area: &Area,
        term: Option<&str>,
        offset: u32,
    ) -> Result<SearchResponse> {
        let mut params = vec![
            ("latitude".to_string(), area.latitude.to_string()),
            ("longitude".to_string(), area.longitude.to_string()),
            ("radius".to_string(), self.config.radius_m.to_string()),
            ("limit".to_string(), self.config.page_size.to_string()),
            ("offset".to_string(), offset.to_string()),
            ("categories".to_string(), "restaurants".to_string()),
            ("sort_by".to_string(), "best_match".to_string()),
        ];
        if let Some(term) = term {
            params.push(("term".to_string(), term.to_string()));
        }

        let request = || {
            self.client
                .get(&self.config.base_url)
                .bearer_auth(&self.config.api_key)
                .query(&params)
                .send()
        };

        let mut response = request().await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                "rate limited (429); sleeping {:?} before one retry",
                self.config.retry_delay
            );
            sleep(self.config.retry_delay).await;
            response = request().await?;
        }
        let response = response.error_for_status()?;
        response
            .json::<SearchResponse>()
            .await
            .context("decoding search response")
    }

    /// Page one (area, term) query, appending businesses to `out`. Stops
    /// at the max offset, an empty page, the reported total, or the first
    /// unrecoverable HTTP error (usually a 400 once offset passes the
    /// query's total).
    async fn run_query(&self, area: &Area, term: Option<&str>, out: &mut Vec<Business>) {
        let mut offset = 0;
        while offset < self.config.max_offset {
            let page = match self.fetch_page(area, term, offset).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "abandoning area={} term={term:?} at offset {offset}: {e:#}",
                        area.name
                    );
                    return;
                }
            };
            info!(
                "area={} term={term:?} offset={offset}: {} businesses of {}",
                area.name,
                page.businesses.len(),
                page.total
            );
            if page.businesses.is_empty() {
                return;
            }
            let total = page.total;
            out.extend(page.businesses);
            if offset + self.config.page_size >= total {
                return;
            }
            offset += self.config.page_size;
            sleep(self.config.page_delay).await;
        }
    }
}

#[async_trait]
impl BusinessSource for YelpSearch {
    async fn businesses(&self) -> Result<DataFrame> {
        let mut raw = Vec::new();
        for area in &self.config.areas {
            for term in &self.config.terms {
                self.run_query(area, term.as_deref(), &mut raw).await;
            }
        }
        info!("fetched {} raw listings (duplicates included)", raw.len());
        let unique = dedup_by_id(raw);
        info!("{} unique listings after id dedup", unique.len());
        to_frame(&unique)
    }
}

/// Keep the first occurrence per listing id; drop listings without one.
fn dedup_by_id(businesses: Vec<Business>) -> Vec<Business> {
    let mut seen = HashSet::new();
    businesses
        .into_iter()
        .filter(|b| match &b.id {
            Some(id) => seen.insert(id.clone()),
            None => false,
        })
        .collect()
}

/// Flatten API records into the listing table schema.
fn to_frame(businesses: &[Business]) -> Result<DataFrame> {
    let ids: Vec<Option<&str>> = businesses.iter().map(|b| b.id.as_deref()).collect();
    let names: Vec<Option<&str>> = businesses.iter().map(|b| b.name.as_deref()).collect();
    let ratings: Vec<Option<f64>> = businesses.iter().map(|b| b.rating).collect();
    let review_counts: Vec<Option<i64>> = businesses.iter().map(|b| b.review_count).collect();
    let prices: Vec<Option<&str>> = businesses.iter().map(|b| b.price.as_deref()).collect();
    let categories: Vec<String> = businesses.iter().map(Business::category_titles).collect();
    let addresses: Vec<Option<&str>> = businesses
        .iter()
        .map(|b| b.location.address1.as_deref())
        .collect();
    let cities: Vec<Option<&str>> = businesses
        .iter()
        .map(|b| b.location.city.as_deref())
        .collect();
    let states: Vec<Option<&str>> = businesses
        .iter()
        .map(|b| b.location.state.as_deref())
        .collect();
    let postal_codes: Vec<Option<&str>> = businesses
        .iter()
        .map(|b| b.location.zip_code.as_deref())
        .collect();
    let latitudes: Vec<Option<f64>> = businesses
        .iter()
        .map(|b| b.coordinates.latitude)
        .collect();
    let longitudes: Vec<Option<f64>> = businesses
        .iter()
        .map(|b| b.coordinates.longitude)
        .collect();
    let urls: Vec<Option<&str>> = businesses.iter().map(|b| b.url.as_deref()).collect();

    let df = DataFrame::new(vec![
        Series::new("yelp_id", ids),
        Series::new("name", names),
        Series::new("rating", ratings),
        Series::new("review_count", review_counts),
        Series::new("price", prices),
        Series::new("categories", categories),
        Series::new("address1", addresses),
        Series::new("city", cities),
        Series::new("state", states),
        Series::new("postal_code", postal_codes),
        Series::new("latitude", latitudes),
        Series::new("longitude", longitudes),
        Series::new("url", urls),
    ])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yelp_api::{Coordinates, Location};

    fn business(id: Option<&str>, name: &str) -> Business {
        Business {
            id: id.map(str::to_string),
            name: Some(name.to_string()),
            rating: Some(4.0),
            review_count: Some(10),
            location: Location {
                address1: Some("7 Carmine St".to_string()),
                city: Some("New York".to_string()),
                state: Some("NY".to_string()),
                zip_code: Some("10014".to_string()),
            },
            coordinates: Coordinates {
                latitude: Some(40.73),
                longitude: Some(-74.0),
            },
            ..Default::default()
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_per_id() {
        let unique = dedup_by_id(vec![
            business(Some("a"), "First"),
            business(Some("b"), "Second"),
            business(Some("a"), "Duplicate"),
            business(None, "No id"),
        ]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name.as_deref(), Some("First"));
        assert_eq!(unique[1].name.as_deref(), Some("Second"));
    }

    #[test]
    fn listing_frame_schema() {
        let df = to_frame(&[business(Some("a"), "Joe's Pizza")]).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(
            df.get_column_names(),
            vec![
                "yelp_id",
                "name",
                "rating",
                "review_count",
                "price",
                "categories",
                "address1",
                "city",
                "state",
                "postal_code",
                "latitude",
                "longitude",
                "url",
            ]
        );
        assert_eq!(df.column("yelp_id").unwrap().utf8().unwrap().get(0), Some("a"));
        assert_eq!(
            df.column("postal_code").unwrap().utf8().unwrap().get(0),
            Some("10014")
        );
    }

    #[test]
    fn empty_scrape_yields_empty_frame() {
        let df = to_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 13);
    }
}
