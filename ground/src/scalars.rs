//! Time and weather values carried by the save record.
//!
//! The ground core does not simulate either; it only stores what the time
//! and weather systems hand it and gives the values back after a load.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Fall,
    Winter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Weather {
    #[default]
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

// Time and weather systems exchange these as raw integers.

impl From<Season> for i32 {
    fn from(season: Season) -> Self {
        season as i32
    }
}

impl TryFrom<i32> for Season {
    type Error = GridError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Season::Spring),
            1 => Ok(Season::Summer),
            2 => Ok(Season::Fall),
            3 => Ok(Season::Winter),
            other => Err(GridError::CorruptRecord(format!("unknown season {other}"))),
        }
    }
}

impl From<Weather> for i32 {
    fn from(weather: Weather) -> Self {
        weather as i32
    }
}

impl TryFrom<i32> for Weather {
    type Error = GridError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Weather::Sunny),
            1 => Ok(Weather::Cloudy),
            2 => Ok(Weather::Rainy),
            3 => Ok(Weather::Snowy),
            other => Err(GridError::CorruptRecord(format!("unknown weather {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TimeState {
    pub minute: i32,
    pub hour: i32,
    pub day_in_season: i32,
    pub season: Season,
    pub real_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WeatherState {
    pub weather: Weather,
    pub base_temperature: i32,
}

/// Read/write access the time system exposes to the ground core.
pub trait TimeSource {
    fn time_state(&self) -> TimeState;
    fn set_time_state(&mut self, state: TimeState);
}

/// Read/write access the weather system exposes to the ground core.
pub trait WeatherSource {
    fn weather_state(&self) -> WeatherState;
    fn set_weather_state(&mut self, state: WeatherState);
}

/// All non-grid values in the save record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldScalars {
    pub time: TimeState,
    pub weather: WeatherState,
}

impl WorldScalars {
    pub fn capture(time: &dyn TimeSource, weather: &dyn WeatherSource) -> Self {
        Self {
            time: time.time_state(),
            weather: weather.weather_state(),
        }
    }

    pub fn apply(&self, time: &mut dyn TimeSource, weather: &mut dyn WeatherSource) {
        time.set_time_state(self.time);
        weather.set_weather_state(self.weather);
    }

    pub fn base_temperature(&self) -> i32 {
        self.weather.base_temperature
    }
}
