use serde::{Deserialize, Serialize};

/// One page of results from the business-search endpoint.
///
/// `total` is the number of results the API reports for the whole query,
/// not for this page; pagination stops once offset + limit passes it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub businesses: Vec<Business>,
    #[serde(default)]
    pub total: u32,
}

/// A single business as returned by the search API. Listings without an
/// `id` are unusable downstream and get skipped during dedup.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Business {
    pub id: Option<String>,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub price: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub coordinates: Coordinates,
    pub url: Option<String>,
}

impl Business {
    /// Category titles joined into a single tabular cell.
    pub fn category_titles(&self) -> String {
        self.categories
            .iter()
            .filter_map(|c| c.title.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Category {
    pub alias: Option<String>,
    pub title: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Location {
    pub address1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_search_page() {
        let payload = r#"{
            "businesses": [
                {
                    "id": "abc123",
                    "name": "Joe's Pizza",
                    "rating": 4.5,
                    "review_count": 2310,
                    "price": "$",
                    "categories": [
                        {"alias": "pizza", "title": "Pizza"},
                        {"alias": "italian", "title": "Italian"}
                    ],
                    "location": {
                        "address1": "7 Carmine St",
                        "city": "New York",
                        "state": "NY",
                        "zip_code": "10014",
                        "display_address": ["7 Carmine St", "New York, NY 10014"]
                    },
                    "coordinates": {"latitude": 40.7305, "longitude": -74.0021},
                    "url": "https://example.com/joes-pizza",
                    "transactions": ["pickup", "delivery"]
                }
            ],
            "total": 1200,
            "region": {"center": {"latitude": 40.73, "longitude": -74.0}}
        }"#;
        let page: SearchResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(page.total, 1200);
        assert_eq!(page.businesses.len(), 1);
        let b = &page.businesses[0];
        assert_eq!(b.id.as_deref(), Some("abc123"));
        assert_eq!(b.location.zip_code.as_deref(), Some("10014"));
        assert_eq!(b.category_titles(), "Pizza, Italian");
    }

    #[test]
    fn tolerates_sparse_records() {
        let page: SearchResponse =
            serde_json::from_str(r#"{"businesses": [{"id": "x"}], "total": 0}"#).unwrap();
        let b = &page.businesses[0];
        assert_eq!(b.name, None);
        assert!(b.categories.is_empty());
        assert_eq!(b.coordinates.latitude, None);
        assert_eq!(b.category_titles(), "");
    }

    #[test]
    fn missing_fields_default() {
        let page: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(page.businesses.is_empty());
        assert_eq!(page.total, 0);
    }
}
