//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The shared retry/backoff executor
//! - Weather and nearby-cities providers behind async traits
//! - Shared domain models
//!
//! It is used by `cityweather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod retry;

pub use config::{Config, GeoBytesConfig, OpenWeatherConfig};
pub use error::FetchError;
pub use model::{Condition, Coordinates, NearbyCity, WeatherReport};
pub use provider::{NearbyCitiesProvider, WeatherProvider};
pub use retry::RetryPolicy;
