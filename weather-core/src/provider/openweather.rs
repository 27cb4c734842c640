use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    Config,
    model::{Condition, LocationQuery, RawCurrentConditions, RawForecastEntry},
};

use super::{ProviderError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weather configure` or set OPENWEATHER_API_KEY."
            )
        })?;

        Ok(match config.base_url() {
            Some(url) => Self::with_base_url(api_key.to_owned(), url),
            None => Self::new(api_key.to_owned()),
        })
    }

    fn params(&self, query: &LocationQuery) -> Vec<(&'static str, String)> {
        let mut params = match query {
            LocationQuery::City(name) => vec![("q", name.clone())],
            LocationQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };
        params.push(("units", "metric".to_string()));
        params.push(("appid", self.api_key.clone()));
        params
    }

    async fn get(
        &self,
        endpoint: &'static str,
        query: &LocationQuery,
    ) -> Result<(StatusCode, String), ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(
            endpoint,
            by_coordinates = query.is_coordinates(),
            "requesting OpenWeather"
        );

        let res = self.http.get(&url).query(&self.params(query)).send().await?;
        let status = res.status();
        let body = res.text().await?;
        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    id: u32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Only the status code; OpenWeather sends it as a number on some
/// endpoints and as a string on others.
#[derive(Debug, Deserialize)]
struct OwStatus {
    cod: Option<serde_json::Value>,
}

fn cod_of(body: &str) -> Option<String> {
    let status: OwStatus = serde_json::from_str(body).ok()?;
    match status.cod? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_condition(weather: Vec<OwWeather>) -> Condition {
    weather
        .into_iter()
        .next()
        .map(|w| Condition {
            id: w.id,
            main: w.main,
            description: w.description,
            icon: w.icon,
        })
        .unwrap_or_else(|| Condition {
            id: 0,
            main: "Unknown".to_string(),
            description: "unknown".to_string(),
            icon: String::new(),
        })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(
        &self,
        query: &LocationQuery,
    ) -> Result<RawCurrentConditions, ProviderError> {
        let (status, body) = self.get("weather", query).await?;

        if status == StatusCode::NOT_FOUND || cod_of(&body).as_deref() == Some("404") {
            tracing::warn!(%query, "OpenWeather has no match for location");
            return Err(ProviderError::NotFound { query: query.to_string() });
        }

        if !status.is_success() {
            tracing::warn!(%status, "OpenWeather current request failed");
            return Err(ProviderError::Status {
                endpoint: "current weather",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|source| {
            ProviderError::Decode { context: "OpenWeather current", source }
        })?;

        Ok(RawCurrentConditions {
            name: parsed.name,
            country: parsed.sys.country,
            condition: first_condition(parsed.weather),
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
            observed_at: parsed.dt,
            sunrise: parsed.sys.sunrise,
            sunset: parsed.sys.sunset,
        })
    }

    async fn fetch_forecast(
        &self,
        query: &LocationQuery,
    ) -> Result<Vec<RawForecastEntry>, ProviderError> {
        let (status, body) = self.get("forecast", query).await?;

        let code = cod_of(&body).unwrap_or_else(|| status.as_u16().to_string());
        if code != "200" {
            tracing::warn!(%code, "OpenWeather forecast rejected");
            return Err(ProviderError::Rejected { code });
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body).map_err(|source| {
            ProviderError::Decode { context: "OpenWeather forecast", source }
        })?;

        Ok(parsed
            .list
            .into_iter()
            .map(|e| RawForecastEntry {
                timestamp: e.dt,
                local_time: e.dt_txt,
                temperature_c: e.main.temp,
                condition: first_condition(e.weather),
            })
            .collect())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
