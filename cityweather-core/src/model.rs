use serde::{Deserialize, Serialize};

/// A point on the globe, carried verbatim from the weather response into the
/// nearby-cities query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Short group, e.g. "Clouds".
    pub main: String,
    /// Longer text, e.g. "scattered clouds".
    pub description: String,
}

/// Current weather for one city, in imperial units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub country: Option<String>,
    pub condition: Condition,
    pub temperature_f: f64,
    pub feels_like_f: f64,
    pub humidity_pct: u8,
    pub wind_speed_mph: f64,
    pub cloudiness_pct: u8,
    pub coordinates: Coordinates,
}

impl WeatherReport {
    /// "City, CC", or just the city when no country was reported.
    pub fn location_label(&self) -> String {
        match self.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", self.city, country),
            _ => self.city.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearbyCity {
    pub name: String,
    /// State or region code, e.g. "CA".
    pub region: String,
}
