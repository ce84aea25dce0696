//! Human-readable rendering of weather and nearby-city results.

use std::io::{self, Write};

use cityweather_core::{NearbyCity, WeatherReport};

const RULE: &str = "_______________________";

pub fn write_weather<W: Write>(out: &mut W, report: &WeatherReport) -> io::Result<()> {
    writeln!(out, "|{RULE}[Weather in {}]{RULE}|", report.location_label())?;
    writeln!(
        out,
        "    Currently, the weather is {} ({}).",
        report.condition.main, report.condition.description
    )?;
    writeln!(
        out,
        "    The current temperature is {}°F, but it feels like {}°F.",
        report.temperature_f, report.feels_like_f
    )?;
    writeln!(out, "    The Humidity is {}%.", report.humidity_pct)?;
    writeln!(out, "    Currently, the wind is {} MPH.", report.wind_speed_mph)?;
    writeln!(out, "    The Cloudiness is {}%.", report.cloudiness_pct)
}

/// Prints nothing when there are no nearby cities.
pub fn write_nearby<W: Write>(out: &mut W, cities: &[NearbyCity]) -> io::Result<()> {
    if cities.is_empty() {
        return Ok(());
    }
    writeln!(out, "|{RULE}[Nearby Cities]{RULE}|")?;
    for city in cities {
        writeln!(out, "{}, {}", city.name, city.region)?;
    }
    Ok(())
}

pub fn write_invalid_city<W: Write>(out: &mut W, city: &str) -> io::Result<()> {
    writeln!(out, "{city} is an Invalid input. Please use a city name.")
}

pub fn write_backoff_exhausted<W: Write>(out: &mut W, attempts: u32) -> io::Result<()> {
    writeln!(out, "Backoff unsuccessful after {attempts} attempts. Please try again later. Exiting")
}
