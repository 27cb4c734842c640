use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What the user asked for: a typed city name or a geolocation fix.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl LocationQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self::City(name.into())
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self::Coordinates { lat, lon }
    }

    pub fn is_coordinates(&self) -> bool {
        matches!(self, Self::Coordinates { .. })
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::City(name) => f.write_str(name),
            Self::Coordinates { lat, lon } => write!(f, "{lat:.4},{lon:.4}"),
        }
    }
}

/// Provider condition block: numeric id, group name ("Rain"), free text and icon id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Current conditions as reported by the provider. Temperatures are Celsius
/// because every request is made in metric units; timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCurrentConditions {
    pub name: String,
    pub country: String,
    pub condition: Condition,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub observed_at: i64,
    pub sunrise: i64,
    pub sunset: i64,
}

/// One 3-hour forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawForecastEntry {
    pub timestamp: i64,
    /// Provider `dt_txt`, e.g. "2024-05-01 12:00:00".
    pub local_time: String,
    pub temperature_c: f64,
    pub condition: Condition,
}

/// The noon sample retained for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub entry: RawForecastEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl DisplayUnit {
    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Convert a canonical Celsius reading into this unit.
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => crate::view_model::celsius_to_fahrenheit(celsius),
        }
    }

    /// Label for the affordance that switches to the other unit.
    pub fn toggle_label(self) -> String {
        format!("Show in {}", self.toggled().suffix())
    }
}

/// A rounded temperature ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature {
    pub value: i64,
    pub unit: DisplayUnit,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}
