use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    model::{Coordinates, NearbyCity},
    provider::truncate_body,
    retry::{self, RetryPolicy},
};

use super::NearbyCitiesProvider;

pub const DEFAULT_NEARBY_URL: &str = "http://getnearbycities.geobytes.com/GetNearbyCities";

const DEFAULT_RADIUS_MILES: u32 = 100;

/// GeoBytes GetNearbyCities client.
///
/// The API answers with a JSON array whose first entry describes the queried
/// point itself; every later entry is a nearby city whose second and third
/// fields are the city name and region code.
#[derive(Debug, Clone)]
pub struct GeoBytesProvider {
    url: String,
    radius: u32,
    retry: RetryPolicy,
    http: Client,
}

impl Default for GeoBytesProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoBytesProvider {
    pub fn new() -> Self {
        Self {
            url: DEFAULT_NEARBY_URL.to_string(),
            radius: DEFAULT_RADIUS_MILES,
            retry: RetryPolicy::default(),
            http: Client::new(),
        }
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_nearby(&self, origin: Coordinates) -> Result<Vec<NearbyCity>, FetchError> {
        let http = &self.http;
        let url = self.url.as_str();
        let radius = self.radius.to_string();
        let longitude = origin.longitude.to_string();
        let latitude = origin.latitude.to_string();
        let query = [
            ("radius", radius.as_str()),
            ("longitude", longitude.as_str()),
            ("latitude", latitude.as_str()),
        ];

        let res = retry::execute(&self.retry, move || async move {
            http.get(url).query(&query).send().await.map_err(FetchError::from)
        })
        .await?;

        let body = res.text().await?;
        let entries: Vec<Value> = serde_json::from_str(&body).inspect_err(|err| {
            debug!(error = %err, body = truncate_body(&body), "unexpected GeoBytes payload");
        })?;

        Ok(parse_entries(&entries))
    }
}

/// Map every entry after the first to a city, skipping unreadable ones.
fn parse_entries(entries: &[Value]) -> Vec<NearbyCity> {
    entries
        .iter()
        .skip(1)
        .filter_map(|entry| {
            let city = parse_entry(entry);
            if city.is_none() {
                warn!(%entry, "skipping nearby-city entry without name and region");
            }
            city
        })
        .collect()
}

fn parse_entry(entry: &Value) -> Option<NearbyCity> {
    let fields: Vec<String> = match entry {
        Value::Array(items) => items.iter().take(3).map(field_text).collect(),
        Value::String(text) => text.split(',').take(3).map(|f| f.trim().to_string()).collect(),
        _ => return None,
    };

    match fields.as_slice() {
        [_, name, region] if !name.is_empty() => {
            Some(NearbyCity { name: name.clone(), region: region.clone() })
        }
        _ => None,
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl NearbyCitiesProvider for GeoBytesProvider {
    async fn nearby_cities(&self, origin: Coordinates) -> Result<Vec<NearbyCity>, FetchError> {
        self.fetch_nearby(origin).await
    }
}
