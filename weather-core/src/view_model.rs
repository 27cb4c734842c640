//! Display state derived from provider payloads.
//!
//! The [`ViewModel`] keeps the provider's Celsius readings untouched and
//! derives every displayed temperature from them on demand, so switching
//! units any number of times never accumulates rounding error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    DisplayUnit, ForecastDay, RawCurrentConditions, RawForecastEntry, Temperature,
};

/// Time-of-day marker the provider uses for its midday 3-hour step.
pub const NOON_MARKER: &str = "12:00:00";

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionCategory {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Mist,
    Unknown,
}

/// Ordered keyword rules; the first rule with a matching keyword wins.
const CONDITION_RULES: &[(&[&str], ConditionCategory)] = &[
    (&["clear"], ConditionCategory::Clear),
    (&["cloud"], ConditionCategory::Clouds),
    (&["rain", "drizzle"], ConditionCategory::Rain),
    (&["snow"], ConditionCategory::Snow),
    (&["thunderstorm"], ConditionCategory::Thunderstorm),
    (&["mist", "fog", "haze"], ConditionCategory::Mist),
];

/// Case-insensitive keyword classification of a provider condition text.
pub fn classify_condition(text: &str) -> ConditionCategory {
    let lower = text.to_lowercase();
    CONDITION_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(ConditionCategory::Unknown)
}

/// Inclusive at both ends.
pub fn is_daytime(observed_at: i64, sunrise: i64, sunset: i64) -> bool {
    sunrise <= observed_at && observed_at <= sunset
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Nearest integer, halves rounded toward positive infinity.
pub fn round_for_display(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@2x.png")
}

/// Current conditions as the presentation layer consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentView {
    pub location_label: String,
    pub category: ConditionCategory,
    /// Provider condition group, e.g. "Rain".
    pub condition_main: String,
    pub icon: String,
    pub icon_url: String,
    pub description: String,
    pub icon_alt: String,
    pub is_day: bool,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub temperature: Temperature,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCard {
    pub date: NaiveDate,
    pub date_label: String,
    pub temperature: Temperature,
    pub category: ConditionCategory,
    pub condition_main: String,
    pub icon: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    current: Option<RawCurrentConditions>,
    forecast: Vec<ForecastDay>,
    unit: DisplayUnit,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    pub fn forecast_days(&self) -> &[ForecastDay] {
        &self.forecast
    }

    /// Replace the current-conditions snapshot.
    pub fn ingest_current(&mut self, raw: RawCurrentConditions) {
        tracing::debug!(
            location = %raw.name,
            temperature_c = raw.temperature_c,
            condition = %raw.condition.main,
            "ingesting current conditions"
        );
        self.current = Some(raw);
    }

    /// Keep the noon sample of each day and replace the forecast snapshot.
    pub fn ingest_forecast(&mut self, entries: Vec<RawForecastEntry>) {
        let total = entries.len();
        let mut days: Vec<ForecastDay> = Vec::new();

        for entry in entries {
            if !entry.local_time.contains(NOON_MARKER) {
                continue;
            }
            let date = forecast_date(&entry);
            if days.last().is_some_and(|prev| prev.date == date) {
                continue;
            }
            days.push(ForecastDay { date, entry });
        }

        tracing::debug!(total, kept = days.len(), "ingesting forecast");
        self.forecast = days;
    }

    /// Flip the display unit. Returns `false` (and changes nothing) until
    /// current conditions have been ingested.
    pub fn toggle_unit(&mut self) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.unit = self.unit.toggled();
        true
    }

    fn temperature(&self, celsius: f64) -> Temperature {
        Temperature {
            value: round_for_display(self.unit.convert(celsius)),
            unit: self.unit,
        }
    }

    pub fn current_view(&self) -> Option<CurrentView> {
        let raw = self.current.as_ref()?;
        let condition = &raw.condition;

        Some(CurrentView {
            location_label: format!("{}, {}", raw.name, raw.country),
            category: classify_condition(&condition.main),
            condition_main: condition.main.clone(),
            icon: condition.icon.clone(),
            icon_url: icon_url(&condition.icon),
            description: condition.description.to_uppercase(),
            icon_alt: condition.description.clone(),
            is_day: is_daytime(raw.observed_at, raw.sunrise, raw.sunset),
            humidity_pct: raw.humidity_pct,
            wind_speed_mps: raw.wind_speed_mps,
            temperature: self.temperature(raw.temperature_c),
            observed_at: DateTime::from_timestamp(raw.observed_at, 0),
        })
    }

    pub fn forecast_view(&self) -> Vec<ForecastCard> {
        self.forecast
            .iter()
            .map(|day| {
                let condition = &day.entry.condition;
                ForecastCard {
                    date: day.date,
                    date_label: day.date.format("%a, %b %-d").to_string(),
                    temperature: self.temperature(day.entry.temperature_c),
                    category: classify_condition(&condition.main),
                    condition_main: condition.main.clone(),
                    icon: condition.icon.clone(),
                    icon_url: icon_url(&condition.icon),
                }
            })
            .collect()
    }
}

fn forecast_date(entry: &RawForecastEntry) -> NaiveDate {
    NaiveDateTime::parse_from_str(&entry.local_time, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .ok()
        .or_else(|| DateTime::from_timestamp(entry.timestamp, 0).map(|dt| dt.date_naive()))
        .unwrap_or(NaiveDate::MIN)
}
