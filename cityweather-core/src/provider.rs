use crate::{
    Config, FetchError,
    model::{Coordinates, NearbyCity, WeatherReport},
    provider::{geobytes::GeoBytesProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod geobytes;
pub mod openweather;

/// Source of current weather for a named city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, city: &str) -> Result<WeatherReport, FetchError>;
}

/// Source of cities surrounding a point. The queried city itself is not
/// part of the result.
#[async_trait]
pub trait NearbyCitiesProvider: Send + Sync + Debug {
    async fn nearby_cities(&self, origin: Coordinates) -> Result<Vec<NearbyCity>, FetchError>;
}

/// Construct the weather provider from config. Fails when no API key is set.
pub fn weather_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let provider = OpenWeatherProvider::new(api_key.to_owned())
        .with_url(config.openweather.url.clone())
        .with_retry_policy(config.retry);

    Ok(Box::new(provider))
}

/// Construct the nearby-cities provider from config.
pub fn nearby_provider_from_config(config: &Config) -> Box<dyn NearbyCitiesProvider> {
    Box::new(
        GeoBytesProvider::new()
            .with_url(config.geobytes.url.clone())
            .with_radius(config.geobytes.radius)
            .with_retry_policy(config.retry),
    )
}

/// Shorten a response body for log output.
pub(crate) fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
