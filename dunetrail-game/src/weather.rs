//! Weather kinds and the day-indexed forecast
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{DEFAULT_HIGH_TEMP_WEIGHT, DEFAULT_SANDSTORM_WEIGHT, DEFAULT_SUNNY_WEIGHT};

/// Weather conditions that drive daily consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Weather {
    HighTemp,
    #[default]
    Sunny,
    Sandstorm,
}

impl Weather {
    /// Parse the code used by stage files (`sun`, `high`, `sand`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "sun" => Some(Self::Sunny),
            "high" => Some(Self::HighTemp),
            "sand" => Some(Self::Sandstorm),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::HighTemp => "high",
            Self::Sunny => "sun",
            Self::Sandstorm => "sand",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HighTemp => "High Temperature",
            Self::Sunny => "Sunny",
            Self::Sandstorm => "Sandstorm",
        }
    }

    /// Sandstorms stop travel progress without stopping the clock.
    #[must_use]
    pub const fn blocks_travel(self) -> bool {
        matches!(self, Self::Sandstorm)
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const WEATHER_ORDER: [Weather; 3] = [Weather::Sunny, Weather::HighTemp, Weather::Sandstorm];

/// Errors raised by forecast lookups and generation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WeatherError {
    #[error("no weather forecast for day {day} (forecast covers {len} days)")]
    OutOfRange { day: u32, len: usize },
    #[error("no weather forecast before day 0")]
    BeforeFirstDay,
    #[error("weather odds must not all be zero")]
    EmptyOdds,
}

/// Relative weights for random weather generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherOdds {
    pub sunny: u32,
    pub high_temp: u32,
    pub sandstorm: u32,
}

impl Default for WeatherOdds {
    fn default() -> Self {
        Self {
            sunny: DEFAULT_SUNNY_WEIGHT,
            high_temp: DEFAULT_HIGH_TEMP_WEIGHT,
            sandstorm: DEFAULT_SANDSTORM_WEIGHT,
        }
    }
}

impl WeatherOdds {
    #[must_use]
    pub const fn new(sunny: u32, high_temp: u32, sandstorm: u32) -> Self {
        Self {
            sunny,
            high_temp,
            sandstorm,
        }
    }

    #[must_use]
    pub const fn weight(&self, weather: Weather) -> u32 {
        match weather {
            Weather::Sunny => self.sunny,
            Weather::HighTemp => self.high_temp,
            Weather::Sandstorm => self.sandstorm,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        WEATHER_ORDER
            .iter()
            .map(|weather| self.weight(*weather))
            .sum()
    }

    /// Draw one day's weather.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::EmptyOdds`] when every weight is zero.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Weather, WeatherError> {
        let total = self.total();
        if total == 0 {
            return Err(WeatherError::EmptyOdds);
        }
        let mut roll = rng.gen_range(0..total);
        for weather in WEATHER_ORDER {
            let weight = self.weight(weather);
            if roll < weight {
                return Ok(weather);
            }
            roll -= weight;
        }
        Ok(Weather::Sandstorm)
    }
}

/// Day-indexed weather forecast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherTimeline {
    days: Vec<Weather>,
}

impl WeatherTimeline {
    #[must_use]
    pub const fn new(days: Vec<Weather>) -> Self {
        Self { days }
    }

    /// Generate `days` entries from `odds`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::EmptyOdds`] when every weight is zero.
    pub fn random<R: Rng + ?Sized>(
        odds: &WeatherOdds,
        days: u32,
        rng: &mut R,
    ) -> Result<Self, WeatherError> {
        let days = (0..days)
            .map(|_| odds.pick(rng))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { days })
    }

    /// Reproducible forecast from a seed.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::EmptyOdds`] when every weight is zero.
    pub fn seeded(odds: &WeatherOdds, days: u32, seed: u64) -> Result<Self, WeatherError> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Self::random(odds, days, &mut rng)
    }

    /// Weather on `day`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::OutOfRange`] past the end of the forecast.
    pub fn at(&self, day: u32) -> Result<Weather, WeatherError> {
        usize::try_from(day)
            .ok()
            .and_then(|index| self.days.get(index))
            .copied()
            .ok_or(WeatherError::OutOfRange {
                day,
                len: self.days.len(),
            })
    }

    #[must_use]
    pub fn get(&self, day: u32) -> Option<Weather> {
        self.at(day).ok()
    }

    pub fn push(&mut self, weather: Weather) {
        self.days.push(weather);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Weather> + '_ {
        self.days.iter().copied()
    }
}

impl FromIterator<Weather> for WeatherTimeline {
    fn from_iter<I: IntoIterator<Item = Weather>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}
