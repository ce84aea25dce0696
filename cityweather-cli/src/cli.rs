use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use cityweather_core::{
    Config, FetchError, NearbyCitiesProvider, WeatherProvider,
    provider::{nearby_provider_from_config, weather_provider_from_config},
};
use clap::Parser;
use tracing::{debug, warn};

use crate::output;

/// EX_TEMPFAIL from sysexits.h.
const EXIT_BACKOFF_EXHAUSTED: u8 = 75;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "cityweather",
    version,
    about = "Current weather and nearby cities for a city"
)]
pub struct Cli {
    /// City name. Multiple words are joined without separators.
    #[arg(required_unless_present = "configure", num_args = 1..)]
    pub city: Vec<String>,

    /// Prompt for the OpenWeather API key and store it in the config file.
    #[arg(long, conflicts_with = "city")]
    pub configure: bool,

    /// OpenWeather API key; overrides the stored one.
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// How a lookup ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    BackoffExhausted,
}

impl Completion {
    /// Raw process status: 0, or EX_TEMPFAIL after backoff exhaustion.
    pub fn status(self) -> u8 {
        match self {
            Completion::Done => 0,
            Completion::BackoffExhausted => EXIT_BACKOFF_EXHAUSTED,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.status())
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        if self.configure {
            configure()?;
            return Ok(ExitCode::SUCCESS);
        }

        let mut config = Config::load()?;
        if let Some(api_key) = self.api_key {
            config.set_api_key(api_key);
        }

        let weather = weather_provider_from_config(&config)?;
        let nearby = nearby_provider_from_config(&config);
        let city = join_city_words(&self.city);

        let completion = report(&city, weather.as_ref(), nearby.as_ref(), &mut io::stdout()).await?;
        Ok(completion.exit_code())
    }
}

/// Concatenate the city arguments with no separator.
pub fn join_city_words(words: &[String]) -> String {
    words.concat()
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key);
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Fetch and print the weather for `city`, then the cities around it.
///
/// The nearby-cities lookup only runs once the weather has been printed and
/// its coordinates are usable.
pub async fn report<W: Write>(
    city: &str,
    weather: &dyn WeatherProvider,
    nearby: &dyn NearbyCitiesProvider,
    out: &mut W,
) -> anyhow::Result<Completion> {
    let current = match weather.current_weather(city).await {
        Ok(current) => current,
        Err(FetchError::Exhausted { attempts, .. }) => {
            output::write_backoff_exhausted(out, attempts)?;
            return Ok(Completion::BackoffExhausted);
        }
        Err(err) => {
            debug!(city, error = %err, "weather lookup failed");
            output::write_invalid_city(out, city)?;
            return Ok(Completion::Done);
        }
    };

    output::write_weather(out, &current)?;

    if !current.coordinates.is_valid() {
        warn!(coordinates = ?current.coordinates, "skipping nearby cities, bad coordinates");
        return Ok(Completion::Done);
    }

    match nearby.nearby_cities(current.coordinates).await {
        Ok(cities) => output::write_nearby(out, &cities)?,
        Err(FetchError::Exhausted { attempts, .. }) => {
            output::write_backoff_exhausted(out, attempts)?;
            return Ok(Completion::BackoffExhausted);
        }
        Err(err) => return Err(err).context("Failed to fetch nearby cities"),
    }

    Ok(Completion::Done)
}
