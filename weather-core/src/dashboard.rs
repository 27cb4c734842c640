//! Ties input, the provider and the view model together.
//!
//! A [`Dashboard`] turns one user action into two provider lookups and keeps
//! them pending until the caller drives them with [`Dashboard::next_update`].
//! Each result is applied to the [`ViewModel`] as soon as it arrives, so a
//! slow forecast never holds back current conditions (or the reverse).
//! [`Dashboard::screen`] exposes a snapshot for whatever renders it.

use std::{fmt, sync::Arc};

use futures::{
    FutureExt, StreamExt,
    future::BoxFuture,
    stream::FuturesUnordered,
};
use thiserror::Error;

use crate::{
    model::{DisplayUnit, LocationQuery, RawCurrentConditions, RawForecastEntry},
    provider::{ProviderError, WeatherProvider},
    scene::Scene,
    view_model::{CurrentView, ForecastCard, ViewModel},
};

/// Errors shown to the user. Each one hides the weather panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("City not found.")]
    CityNotFound,
    #[error("Error fetching weather data.")]
    FetchFailed,
    #[error("Unable to fetch weather.")]
    LocationFetchFailed,
    #[error("Please enter a city name.")]
    EmptyInput,
    #[error("Geolocation denied. Enter city manually.")]
    GeolocationDenied,
    #[error("Geolocation not supported.")]
    GeolocationUnsupported,
}

/// Outcome of asking the platform where the user is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geolocation {
    Position { lat: f64, lon: f64 },
    Denied,
    Unsupported,
}

/// Which lookup [`Dashboard::next_update`] just applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Current,
    Forecast,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub error: Option<UserError>,
    pub current: Option<CurrentView>,
    pub forecast: Option<Vec<ForecastCard>>,
    pub scene: Scene,
    pub unit: DisplayUnit,
    pub toggle_label: String,
}

enum Outcome {
    Current {
        query: LocationQuery,
        result: Result<RawCurrentConditions, ProviderError>,
    },
    Forecast(Result<Vec<RawForecastEntry>, ProviderError>),
}

pub struct Dashboard<P> {
    provider: Arc<P>,
    model: ViewModel,
    pending: FuturesUnordered<BoxFuture<'static, Outcome>>,
    error: Option<UserError>,
    weather_visible: bool,
    forecast_visible: bool,
    /// A forecast from the latest action has been ingested.
    forecast_ready: bool,
    scene: Scene,
    compact_effects: bool,
}

impl<P: fmt::Debug> fmt::Debug for Dashboard<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("pending", &self.pending.len())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<P: WeatherProvider + 'static> Dashboard<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            model: ViewModel::new(),
            pending: FuturesUnordered::new(),
            error: None,
            weather_visible: false,
            forecast_visible: false,
            forecast_ready: false,
            scene: Scene::default(),
            compact_effects: false,
        }
    }

    /// Halve precipitation particles, for narrow displays.
    pub fn with_compact_effects(mut self, compact: bool) -> Self {
        self.compact_effects = compact;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn model(&self) -> &ViewModel {
        &self.model
    }

    /// Handle submitted search text.
    pub fn submit(&mut self, text: &str) {
        let city = text.trim();
        if city.is_empty() {
            self.show_error(UserError::EmptyInput);
            return;
        }
        self.start(LocationQuery::city(city));
    }

    /// Handle the geolocation result delivered at startup.
    pub fn locate(&mut self, geolocation: Geolocation) {
        match geolocation {
            Geolocation::Position { lat, lon } => self.start(LocationQuery::coordinates(lat, lon)),
            Geolocation::Denied => self.show_error(UserError::GeolocationDenied),
            Geolocation::Unsupported => self.show_error(UserError::GeolocationUnsupported),
        }
    }

    /// Switch units without refetching. Returns whether anything changed.
    pub fn toggle_unit(&mut self) -> bool {
        let toggled = self.model.toggle_unit();
        if toggled {
            tracing::debug!(unit = ?self.model.unit(), "display unit toggled");
        }
        toggled
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queue both lookups for `query`. Lookups still pending from an earlier
    /// action are dropped, so their responses can never overwrite this one.
    pub fn start(&mut self, query: LocationQuery) {
        tracing::info!(%query, "loading weather");

        if !self.pending.is_empty() {
            tracing::debug!(stale = self.pending.len(), "dropping lookups from previous action");
        }
        self.pending = FuturesUnordered::new();
        self.forecast_ready = false;

        let provider = Arc::clone(&self.provider);
        let current_query = query.clone();
        self.pending.push(
            async move {
                let result = provider.fetch_current(&current_query).await;
                Outcome::Current { query: current_query, result }
            }
            .boxed(),
        );

        let provider = Arc::clone(&self.provider);
        self.pending.push(
            async move { Outcome::Forecast(provider.fetch_forecast(&query).await) }.boxed(),
        );
    }

    /// Wait for the next lookup to finish and apply it. `None` once nothing
    /// is pending.
    pub async fn next_update(&mut self) -> Option<Lookup> {
        match self.pending.next().await? {
            Outcome::Current { query, result } => {
                self.apply_current(&query, result);
                Some(Lookup::Current)
            }
            Outcome::Forecast(result) => {
                self.apply_forecast(result);
                Some(Lookup::Forecast)
            }
        }
    }

    /// Apply every pending lookup. Does not return while one is hung.
    pub async fn settle(&mut self) {
        while self.next_update().await.is_some() {}
    }

    fn apply_current(
        &mut self,
        query: &LocationQuery,
        result: Result<RawCurrentConditions, ProviderError>,
    ) {
        match result {
            Ok(raw) => {
                self.model.ingest_current(raw);
                self.error = None;
                self.weather_visible = true;
                self.forecast_visible |= self.forecast_ready;
                if let Some(view) = self.model.current_view() {
                    self.scene = Scene::for_view(&view, self.compact_effects);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "current conditions lookup failed");
                let user_error = match (&err, query) {
                    (ProviderError::NotFound { .. }, _) => UserError::CityNotFound,
                    (_, LocationQuery::Coordinates { .. }) => UserError::LocationFetchFailed,
                    (_, LocationQuery::City(_)) => UserError::FetchFailed,
                };
                self.show_error(user_error);
            }
        }
    }

    /// Forecast failures are logged, never shown; the panel keeps its state.
    /// While an error is on screen a new forecast is stored but stays hidden.
    fn apply_forecast(&mut self, result: Result<Vec<RawForecastEntry>, ProviderError>) {
        match result {
            Ok(entries) => {
                self.model.ingest_forecast(entries);
                self.forecast_ready = true;
                self.forecast_visible = self.error.is_none();
            }
            Err(err) => tracing::warn!(error = %err, "forecast lookup failed, keeping panel as is"),
        }
    }

    fn show_error(&mut self, error: UserError) {
        tracing::info!(%error, "showing error");
        self.error = Some(error);
        self.weather_visible = false;
        self.forecast_visible = false;
        self.scene = self.scene.cleared();
    }

    pub fn screen(&self) -> Screen {
        let unit = self.model.unit();
        Screen {
            error: self.error,
            current: self.model.current_view().filter(|_| self.weather_visible),
            forecast: self.forecast_visible.then(|| self.model.forecast_view()),
            scene: self.scene,
            unit,
            toggle_label: unit.toggle_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Condition;
    use crate::scene::Background;
    use crate::view_model::ConditionCategory;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Debug, Default)]
    struct FakeProvider {
        current: Mutex<Option<Result<RawCurrentConditions, ProviderError>>>,
        forecast: Mutex<Option<Result<Vec<RawForecastEntry>, ProviderError>>>,
        queries: Mutex<Vec<LocationQuery>>,
        current_gate: Option<Arc<Notify>>,
        forecast_gate: Option<Arc<Notify>>,
        forecast_never_returns: bool,
    }

    impl FakeProvider {
        fn answering(
            current: Result<RawCurrentConditions, ProviderError>,
            forecast: Result<Vec<RawForecastEntry>, ProviderError>,
        ) -> Self {
            Self {
                current: Mutex::new(Some(current)),
                forecast: Mutex::new(Some(forecast)),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.queries.lock().expect("lock").len()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_current(
            &self,
            query: &LocationQuery,
        ) -> Result<RawCurrentConditions, ProviderError> {
            self.queries.lock().expect("lock").push(query.clone());
            if let Some(gate) = &self.current_gate {
                gate.notified().await;
            }
            self.current
                .lock()
                .expect("lock")
                .take()
                .expect("unexpected current lookup")
        }

        async fn fetch_forecast(
            &self,
            _query: &LocationQuery,
        ) -> Result<Vec<RawForecastEntry>, ProviderError> {
            if self.forecast_never_returns {
                return std::future::pending().await;
            }
            if let Some(gate) = &self.forecast_gate {
                gate.notified().await;
            }
            self.forecast
                .lock()
                .expect("lock")
                .take()
                .expect("unexpected forecast lookup")
        }
    }

    fn condition(main: &str, description: &str) -> Condition {
        Condition {
            id: 0,
            main: main.into(),
            description: description.into(),
            icon: "10d".into(),
        }
    }

    fn paris() -> RawCurrentConditions {
        RawCurrentConditions {
            name: "Paris".into(),
            country: "FR".into(),
            condition: condition("Rain", "light rain"),
            temperature_c: 15.3,
            humidity_pct: 81,
            wind_speed_mps: 4.1,
            observed_at: 1_500,
            sunrise: 1_000,
            sunset: 2_000,
        }
    }

    fn noon(day: u32, temperature_c: f64) -> RawForecastEntry {
        RawForecastEntry {
            timestamp: 0,
            local_time: format!("2024-05-{day:02} 12:00:00"),
            temperature_c,
            condition: condition("Clouds", "few clouds"),
        }
    }

    fn not_found() -> ProviderError {
        ProviderError::NotFound { query: "Nonexistentville".into() }
    }

    #[tokio::test]
    async fn scenario_a_current_conditions_are_displayed() {
        let provider = FakeProvider::answering(Ok(paris()), Ok(vec![noon(1, 18.0)]));
        let mut dash = Dashboard::new(provider);

        dash.submit("  Paris ");
        dash.settle().await;

        let screen = dash.screen();
        assert_eq!(screen.error, None);
        let current = screen.current.expect("weather panel visible");
        assert_eq!(current.location_label, "Paris, FR");
        assert_eq!(current.description, "LIGHT RAIN");
        assert_eq!(current.temperature.to_string(), "15°C");
        assert_eq!(current.category, ConditionCategory::Rain);
        assert_eq!(screen.scene.background, Background::Rain(crate::scene::TimeOfDay::Day));
        assert_eq!(screen.scene.particles.rain_drops, 100);
        assert_eq!(screen.forecast.map(|f| f.len()), Some(1));
        assert_eq!(
            *dash.provider().queries.lock().expect("lock"),
            vec![LocationQuery::city("Paris")]
        );
    }

    #[tokio::test]
    async fn scenario_b_toggle_rederives_without_refetching() {
        let provider = FakeProvider::answering(Ok(paris()), Ok(vec![noon(1, 18.0)]));
        let mut dash = Dashboard::new(provider);
        dash.submit("Paris");
        dash.settle().await;

        assert!(dash.toggle_unit());

        let screen = dash.screen();
        assert_eq!(screen.current.expect("current").temperature.to_string(), "60°F");
        assert_eq!(screen.forecast.expect("forecast")[0].temperature.to_string(), "64°F");
        assert_eq!(screen.toggle_label, "Show in °C");
        assert_eq!(dash.provider().calls(), 1);
    }

    #[tokio::test]
    async fn scenario_c_not_found_hides_everything() {
        let provider = FakeProvider::answering(Err(not_found()), Ok(vec![noon(1, 18.0)]));
        let mut dash = Dashboard::new(provider);

        dash.submit("Nonexistentville");
        dash.settle().await;

        let screen = dash.screen();
        assert_eq!(screen.error, Some(UserError::CityNotFound));
        assert_eq!(screen.error.map(|e| e.to_string()).as_deref(), Some("City not found."));
        assert!(screen.current.is_none());
        assert!(screen.forecast.is_none());
        assert!(screen.scene.particles.is_empty());
    }

    #[tokio::test]
    async fn scenario_d_empty_input_never_reaches_provider() {
        let mut dash = Dashboard::new(FakeProvider::default());

        dash.submit("   ");

        assert!(!dash.is_loading());
        assert_eq!(dash.next_update().await, None);
        let screen = dash.screen();
        assert_eq!(screen.error.map(|e| e.to_string()).as_deref(), Some("Please enter a city name."));
        assert_eq!(dash.provider().calls(), 0);
    }

    #[tokio::test]
    async fn current_conditions_show_while_forecast_never_returns() {
        let provider = FakeProvider {
            forecast_never_returns: true,
            ..FakeProvider::answering(Ok(paris()), Ok(Vec::new()))
        };
        let mut dash = Dashboard::new(provider);

        dash.submit("Paris");

        assert_eq!(dash.next_update().await, Some(Lookup::Current));
        let screen = dash.screen();
        assert_eq!(screen.current.expect("weather panel visible").location_label, "Paris, FR");
        assert!(screen.forecast.is_none());
        assert!(dash.is_loading());
    }

    #[tokio::test]
    async fn forecast_arriving_after_failed_current_stays_hidden() {
        let gate = Arc::new(Notify::new());
        let provider = FakeProvider {
            forecast_gate: Some(Arc::clone(&gate)),
            ..FakeProvider::answering(Err(not_found()), Ok(vec![noon(1, 18.0)]))
        };
        let mut dash = Dashboard::new(provider);
        dash.submit("Nonexistentville");

        assert_eq!(dash.next_update().await, Some(Lookup::Current));
        gate.notify_one();
        assert_eq!(dash.next_update().await, Some(Lookup::Forecast));
        assert_eq!(dash.next_update().await, None);

        let screen = dash.screen();
        assert_eq!(screen.error, Some(UserError::CityNotFound));
        assert!(screen.forecast.is_none());
        assert_eq!(dash.model().forecast_days().len(), 1);
    }

    #[tokio::test]
    async fn early_forecast_waits_for_current_to_clear_an_error() {
        let gate = Arc::new(Notify::new());
        let provider = FakeProvider {
            current_gate: Some(Arc::clone(&gate)),
            ..FakeProvider::answering(Ok(paris()), Ok(vec![noon(1, 18.0)]))
        };
        let mut dash = Dashboard::new(provider);
        dash.submit("");
        dash.submit("Paris");

        assert_eq!(dash.next_update().await, Some(Lookup::Forecast));
        let screen = dash.screen();
        assert_eq!(screen.error, Some(UserError::EmptyInput));
        assert!(screen.forecast.is_none());

        gate.notify_one();
        assert_eq!(dash.next_update().await, Some(Lookup::Current));
        let screen = dash.screen();
        assert_eq!(screen.error, None);
        assert!(screen.current.is_some());
        assert_eq!(screen.forecast.map(|f| f.len()), Some(1));
    }

    #[tokio::test]
    async fn error_after_success_clears_particles_and_panels() {
        let mut dash = Dashboard::new(FakeProvider::answering(Ok(paris()), Ok(vec![noon(1, 18.0)])));
        dash.submit("Paris");
        dash.settle().await;
        assert!(!dash.screen().scene.particles.is_empty());

        dash.submit("");

        let screen = dash.screen();
        assert!(screen.current.is_none());
        assert!(screen.forecast.is_none());
        assert!(screen.scene.particles.is_empty());
    }

    #[tokio::test]
    async fn forecast_failure_is_silent() {
        let rejected = ProviderError::Rejected { code: "401".into() };
        let mut dash = Dashboard::new(FakeProvider::answering(Ok(paris()), Err(rejected)));

        dash.submit("Paris");
        dash.settle().await;

        let screen = dash.screen();
        assert_eq!(screen.error, None);
        assert!(screen.current.is_some());
        assert!(screen.forecast.is_none());
    }

    #[tokio::test]
    async fn transport_failures_use_generic_messages() {
        let status = |code| ProviderError::Status { endpoint: "current weather", status: code, body: String::new() };

        let mut by_city = Dashboard::new(FakeProvider::answering(Err(status(500)), Ok(Vec::new())));
        by_city.submit("Paris");
        by_city.settle().await;
        assert_eq!(by_city.screen().error, Some(UserError::FetchFailed));

        let mut by_position = Dashboard::new(FakeProvider::answering(Err(status(502)), Ok(Vec::new())));
        by_position.locate(Geolocation::Position { lat: 48.85, lon: 2.35 });
        by_position.settle().await;
        assert_eq!(by_position.screen().error, Some(UserError::LocationFetchFailed));
        assert_eq!(
            *by_position.provider().queries.lock().expect("lock"),
            vec![LocationQuery::coordinates(48.85, 2.35)]
        );
    }

    #[tokio::test]
    async fn geolocation_refusals_are_reported_without_fetching() {
        let mut dash = Dashboard::new(FakeProvider::default());

        dash.locate(Geolocation::Denied);
        assert_eq!(dash.screen().error, Some(UserError::GeolocationDenied));

        dash.locate(Geolocation::Unsupported);
        assert_eq!(
            dash.screen().error.map(|e| e.to_string()).as_deref(),
            Some("Geolocation not supported.")
        );
        assert!(!dash.is_loading());
        assert_eq!(dash.provider().calls(), 0);
    }

    #[tokio::test]
    async fn toggle_before_any_lookup_does_nothing() {
        let mut dash = Dashboard::new(FakeProvider::default());
        assert!(!dash.toggle_unit());
        assert_eq!(dash.screen().unit, DisplayUnit::Celsius);
        assert_eq!(dash.screen().toggle_label, "Show in °F");
    }

    #[tokio::test]
    async fn compact_effects_halve_rain() {
        let provider = FakeProvider::answering(Ok(paris()), Ok(Vec::new()));
        let mut dash = Dashboard::new(provider).with_compact_effects(true);
        dash.submit("Paris");
        dash.settle().await;
        assert_eq!(dash.screen().scene.particles.rain_drops, 50);
    }
}
