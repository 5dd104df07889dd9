//! Run configuration, passed explicitly through the pipeline. Nothing in
//! here reads the environment; credentials are injected by the caller.

use std::time::Duration;

/// One geographic search center.
#[derive(Clone, Debug)]
pub struct Area {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Area {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }
}

/// Search-API scrape parameters: credential, endpoint, and the
/// (area x term) query grid.
#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub api_key: String,
    pub base_url: String,
    pub areas: Vec<Area>,
    /// `None` means a plain restaurants query with no search term.
    pub terms: Vec<Option<String>>,
    pub radius_m: u32,
    pub page_size: u32,
    pub max_offset: u32,
    /// Pause between consecutive pages of one query.
    pub page_delay: Duration,
    /// Backoff before the single retry after a 429.
    pub retry_delay: Duration,
}

impl ScrapeConfig {
    /// Manhattan defaults: four sub-area centers and a term list that
    /// diversifies results beyond the plain restaurants query.
    pub fn manhattan(api_key: String) -> Self {
        let terms = [
            None,
            Some("lunch"),
            Some("dinner"),
            Some("breakfast"),
            Some("brunch"),
            Some("pizza"),
            Some("sushi"),
            Some("chinese"),
            Some("italian"),
            Some("mexican"),
        ];
        Self {
            api_key,
            base_url: "https://api.yelp.com/v3/businesses/search".to_string(),
            areas: vec![
                Area::new("midtown", 40.7580, -73.9855),
                Area::new("upper_west", 40.7870, -73.9754),
                Area::new("upper_east", 40.7736, -73.9566),
                Area::new("lower_manhattan", 40.7081, -74.0064),
            ],
            terms: terms.into_iter().map(|t| t.map(str::to_string)).collect(),
            radius_m: 8_000,
            page_size: 50,
            max_offset: 200,
            page_delay: Duration::from_millis(200),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Which listing-table columns feed key derivation.
#[derive(Clone, Debug)]
pub struct ListingColumns {
    pub name: String,
    pub address: String,
    pub postal_code: String,
}

impl Default for ListingColumns {
    fn default() -> Self {
        Self {
            name: "name".to_string(),
            address: "address1".to_string(),
            postal_code: "postal_code".to_string(),
        }
    }
}

/// Identifier columns and collision suffix used by the matcher.
#[derive(Clone, Debug)]
pub struct MatchOptions {
    pub inspection_id: String,
    pub listing_id: String,
    /// Appended to listing columns whose names collide with inspection
    /// columns.
    pub suffix: String,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            inspection_id: "CAMIS".to_string(),
            listing_id: "yelp_id".to_string(),
            suffix: "_yelp".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_grid_shape() {
        let config = ScrapeConfig::manhattan("key".to_string());
        assert_eq!(config.areas.len(), 4);
        assert_eq!(config.terms.len(), 10);
        assert_eq!(config.terms[0], None);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_offset, 200);
    }
}
