use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{LocationQuery, RawCurrentConditions, RawForecastEntry};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("location not found: {query}")]
    NotFound { query: String },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to parse {context} JSON: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("forecast rejected by provider (cod {code})")]
    Rejected { code: String },
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// The two read-only lookups the dashboard needs. Implementations must not
/// assume any ordering between the calls.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        query: &LocationQuery,
    ) -> Result<RawCurrentConditions, ProviderError>;

    async fn fetch_forecast(
        &self,
        query: &LocationQuery,
    ) -> Result<Vec<RawForecastEntry>, ProviderError>;
}
