//! Nominatim geocoding client

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Point;

/// Nominatim search result
#[derive(Debug, Deserialize)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

/// A resolved free-text search
#[derive(Debug, Clone)]
pub struct NominatimMatch {
    pub location: Point,
    pub display_name: String,
}

/// Nominatim geocoding client
pub struct NominatimClient {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("school-bus-planner/0.1")
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    /// Free-text search; `Ok(None)` when Nominatim returns zero results
    pub async fn search(&self, query: &str) -> Result<Option<NominatimMatch>> {
        let response = self
            .client
            .get(self.search_url(query))
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Nominatim returned status {}", response.status());
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        match results.into_iter().next() {
            Some(result) => {
                let lat: f64 = result.lat.parse().context("Invalid latitude")?;
                let lng: f64 = result.lon.parse().context("Invalid longitude")?;
                Ok(Some(NominatimMatch {
                    location: Point::new(lat, lng),
                    display_name: result.display_name,
                }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        let client = NominatimClient::new("https://nominatim.openstreetmap.org/").unwrap();
        let url = client.search_url("12 Oak St, Springfield");
        assert_eq!(
            url,
            "https://nominatim.openstreetmap.org/search?q=12%20Oak%20St%2C%20Springfield&format=json&limit=1"
        );
    }

    #[test]
    fn test_result_parses() {
        let json = r#"[{"lat":"50.0810","lon":"14.4280","display_name":"Wenceslas Square, Prague"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();
        assert_eq!(results[0].display_name, "Wenceslas Square, Prague");
    }

    // Hits the public Nominatim API
    #[tokio::test]
    #[ignore]
    async fn test_search_prague() {
        let client = NominatimClient::new("https://nominatim.openstreetmap.org").unwrap();

        let result = client.search("Václavské náměstí, Praha").await.unwrap().unwrap();

        assert!((result.location.lat - 50.08).abs() < 0.1);
        assert!((result.location.lng - 14.43).abs() < 0.1);
    }
}
