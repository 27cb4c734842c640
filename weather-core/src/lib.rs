//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherProvider` trait
//! - The view model that turns provider payloads into display state
//! - The dashboard that wires input, provider and view model together
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod dashboard;
pub mod model;
pub mod provider;
pub mod scene;
pub mod view_model;

pub use config::Config;
pub use dashboard::{Dashboard, Geolocation, Lookup, Screen, UserError};
pub use model::{DisplayUnit, LocationQuery, RawCurrentConditions, RawForecastEntry, Temperature};
pub use provider::{OpenWeatherProvider, ProviderError, WeatherProvider};
pub use view_model::{ConditionCategory, CurrentView, ForecastCard, ViewModel};
