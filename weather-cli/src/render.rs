use chrono::Local;
use weather_core::{
    Screen,
    scene::{Background, DEFAULT_GRADIENT, Particles},
};

/// Render one full dashboard frame as plain text.
pub fn render(screen: &Screen) -> String {
    let mut output = render_current(screen);
    output.push_str(&render_forecast(screen));
    output.push_str(&render_hint(screen));
    output
}

/// Error line and current-conditions panel.
pub fn render_current(screen: &Screen) -> String {
    let mut output = String::new();

    if let Some(error) = screen.error {
        output.push_str(&format!("! {error}\n"));
    }

    let Some(current) = &screen.current else {
        return output;
    };

    output.push_str(&format!(
        "{}\n{}\n  {}  [{}]\n  Temperature: {}\n  Humidity: {}%\n  Wind: {} m/s\n",
        backdrop(screen.scene.background),
        current.location_label.to_uppercase(),
        current.description,
        current.icon_alt,
        current.temperature,
        current.humidity_pct,
        current.wind_speed_mps
    ));
    if let Some(at) = current.observed_at {
        output.push_str(&format!("  Observed: {}\n", at.with_timezone(&Local).format("%H:%M")));
    }
    output.push_str(&format!("  Icon: {}\n", current.icon_url));
    if let Some(effects) = effects(&screen.scene.particles) {
        output.push_str(&format!("  {effects}\n"));
    }
    output
}

/// Forecast panel; empty while it is hidden.
pub fn render_forecast(screen: &Screen) -> String {
    let Some(forecast) = &screen.forecast else {
        return String::new();
    };

    let mut output = String::from("5-day forecast\n");
    for card in forecast {
        output.push_str(&format!(
            "  {:<12} {:>6}  {}\n",
            card.date_label,
            card.temperature.to_string(),
            card.condition_main
        ));
    }
    output
}

/// Unit toggle affordance, shown alongside current conditions.
pub fn render_hint(screen: &Screen) -> String {
    if screen.current.is_some() {
        format!("({}: type :u)\n", screen.toggle_label)
    } else {
        String::new()
    }
}

fn backdrop(background: Background) -> String {
    let classes = background.css_classes();
    if classes.is_empty() {
        format!("[{DEFAULT_GRADIENT}]")
    } else {
        format!("[{}]", classes.join(" "))
    }
}

fn effects(p: &Particles) -> Option<String> {
    if p.is_empty() {
        return None;
    }
    let parts: Vec<String> = [("clouds", p.clouds), ("rain", p.rain_drops), ("snow", p.snowflakes)]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(name, n)| format!("{name} x{n}"))
        .collect();
    Some(format!("Effects: {}", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::{
        ConditionCategory, CurrentView, DisplayUnit, Temperature, UserError,
        scene::{Scene, TimeOfDay},
    };

    fn screen_with_current() -> Screen {
        let current = CurrentView {
            location_label: "Paris, FR".into(),
            category: ConditionCategory::Rain,
            condition_main: "Rain".into(),
            icon: "10d".into(),
            icon_url: "https://openweathermap.org/img/wn/10d@2x.png".into(),
            description: "LIGHT RAIN".into(),
            icon_alt: "light rain".into(),
            is_day: true,
            humidity_pct: 81,
            wind_speed_mps: 4.1,
            temperature: Temperature { value: 15, unit: DisplayUnit::Celsius },
            observed_at: None,
        };
        Screen {
            error: None,
            current: Some(current),
            forecast: Some(Vec::new()),
            scene: Scene {
                background: Background::Rain(TimeOfDay::Day),
                particles: Particles { clouds: 3, rain_drops: 100, snowflakes: 0 },
            },
            unit: DisplayUnit::Celsius,
            toggle_label: "Show in °F".into(),
        }
    }

    #[test]
    fn renders_current_conditions() {
        let text = render(&screen_with_current());
        assert!(text.contains("PARIS, FR"));
        assert!(text.contains("LIGHT RAIN"));
        assert!(text.contains("Temperature: 15°C"));
        assert!(text.contains("[rain day]"));
        assert!(text.contains("Effects: clouds x3, rain x100"));
        assert!(text.contains("Show in °F"));
    }

    #[test]
    fn renders_error_only() {
        let screen = Screen {
            error: Some(UserError::EmptyInput),
            current: None,
            forecast: None,
            scene: Scene::default(),
            unit: DisplayUnit::Celsius,
            toggle_label: "Show in °F".into(),
        };
        let text = render(&screen);
        assert_eq!(text, "! Please enter a city name.\n");
    }

    #[test]
    fn forecast_section_is_empty_while_hidden() {
        let mut screen = screen_with_current();
        screen.forecast = None;
        assert_eq!(render_forecast(&screen), "");
        assert!(render(&screen).ends_with("(Show in °F: type :u)\n"));
    }

    #[test]
    fn default_background_uses_gradient() {
        assert_eq!(backdrop(Background::Default), format!("[{DEFAULT_GRADIENT}]"));
    }
}
