use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::FetchError,
    model::{Condition, Coordinates, WeatherReport},
    provider::truncate_body,
    retry::{self, RetryPolicy},
};

use super::WeatherProvider;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Output is printed in °F and MPH.
const UNITS: &str = "imperial";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    url: String,
    retry: RetryPolicy,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            url: DEFAULT_WEATHER_URL.to_string(),
            retry: RetryPolicy::default(),
            http: Client::new(),
        }
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherReport, FetchError> {
        let http = &self.http;
        let url = self.url.as_str();
        let query = [("q", city), ("units", UNITS), ("appid", self.api_key.as_str())];

        let res = retry::execute(&self.retry, move || async move {
            http.get(url).query(&query).send().await.map_err(FetchError::from)
        })
        .await?;

        let body = res.text().await?;
        let parsed: OwCurrentResponse = serde_json::from_str(&body).inspect_err(|err| {
            debug!(error = %err, body = truncate_body(&body), "unexpected OpenWeather payload");
        })?;

        parsed.into_report()
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    clouds: OwClouds,
    #[serde(default)]
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_report(self) -> Result<WeatherReport, FetchError> {
        let weather = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Malformed("weather response has no conditions".into()))?;

        Ok(WeatherReport {
            city: self.name,
            country: self.sys.country,
            condition: Condition { main: weather.main, description: weather.description },
            temperature_f: self.main.temp,
            feels_like_f: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind_speed_mph: self.wind.speed,
            cloudiness_pct: self.clouds.all,
            coordinates: Coordinates::new(self.coord.lat, self.coord.lon),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, city: &str) -> Result<WeatherReport, FetchError> {
        self.fetch_current(city).await
    }
}
