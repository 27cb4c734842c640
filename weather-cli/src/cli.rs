use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use weather_core::{Config, Dashboard, DisplayUnit, Geolocation, Lookup, OpenWeatherProvider};

use crate::render::{render, render_current, render_forecast, render_hint};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather and forecast for a city.
    Show {
        /// City name, e.g. "Paris" or "Paris,FR".
        city: String,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Show weather for a latitude/longitude pair.
    Here {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Interactive dashboard: search cities, toggle units with `:u`, quit with `:q`.
    Dashboard {
        /// Starting position; without it the dashboard reports that
        /// geolocation is unavailable.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Halve rain and snow effects.
        #[arg(long)]
        compact: bool,
    },
}

#[derive(Debug, Args)]
pub struct DisplayArgs {
    /// Temperature unit to display.
    #[arg(long, value_enum, default_value_t = UnitArg::C)]
    unit: UnitArg,

    /// Halve rain and snow effects.
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    C,
    F,
}

impl From<UnitArg> for DisplayUnit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::C => DisplayUnit::Celsius,
            UnitArg::F => DisplayUnit::Fahrenheit,
        }
    }
}

/// One line typed at the dashboard prompt.
#[derive(Debug, PartialEq, Eq)]
enum PromptInput<'a> {
    ToggleUnit,
    Quit,
    Search(&'a str),
}

fn parse_prompt(line: &str) -> PromptInput<'_> {
    match line.trim() {
        ":u" | ":unit" => PromptInput::ToggleUnit,
        ":q" | ":quit" => PromptInput::Quit,
        _ => PromptInput::Search(line),
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, display } => {
                let mut dash = dashboard(display.compact)?;
                dash.submit(&city);
                finish_one_shot(&mut dash, display.unit.into()).await;
                Ok(())
            }
            Command::Here { lat, lon, display } => {
                let mut dash = dashboard(display.compact)?;
                dash.locate(Geolocation::Position { lat, lon });
                finish_one_shot(&mut dash, display.unit.into()).await;
                Ok(())
            }
            Command::Dashboard { lat, lon, compact } => {
                let start = match (lat, lon) {
                    (Some(lat), Some(lon)) => Geolocation::Position { lat, lon },
                    _ => Geolocation::Unsupported,
                };
                interactive(dashboard(compact)?, start).await
            }
        }
    }
}

type OpenWeatherDashboard = Dashboard<OpenWeatherProvider>;

fn dashboard(compact: bool) -> anyhow::Result<OpenWeatherDashboard> {
    let config = Config::load()?.with_env_overrides();
    tracing::debug!(configured = config.is_configured(), "loaded configuration");
    let provider = OpenWeatherProvider::from_config(&config)?;
    Ok(Dashboard::new(provider).with_compact_effects(compact))
}

async fn finish_one_shot(dash: &mut OpenWeatherDashboard, unit: DisplayUnit) {
    if !dash.is_loading() {
        print!("{}", render(&dash.screen()));
        return;
    }
    drive(dash, Some(unit)).await;
}

/// Print each lookup as it lands. Ctrl-C stops waiting and hands control
/// back; the next search drops whatever is still outstanding.
async fn drive(dash: &mut OpenWeatherDashboard, unit: Option<DisplayUnit>) {
    let mut forecast_printed = false;

    loop {
        let update = tokio::select! {
            update = dash.next_update() => update,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("(stopped waiting for the provider)");
                return;
            }
        };

        match update {
            None => return,
            Some(Lookup::Current) => {
                let mut reprint_forecast = false;
                if let Some(unit) = unit {
                    if dash.screen().unit != unit && dash.toggle_unit() {
                        reprint_forecast = forecast_printed;
                    }
                }
                let screen = dash.screen();
                print!("{}", render_current(&screen));
                if reprint_forecast {
                    print!("{}", render_forecast(&screen));
                }
                print!("{}", render_hint(&screen));
            }
            Some(Lookup::Forecast) => {
                let section = render_forecast(&dash.screen());
                forecast_printed |= !section.is_empty();
                print!("{section}");
            }
        }
    }
}

async fn interactive(mut dash: OpenWeatherDashboard, start: Geolocation) -> anyhow::Result<()> {
    dash.locate(start);
    if dash.is_loading() {
        drive(&mut dash, None).await;
    } else {
        print!("{}", render(&dash.screen()));
    }

    loop {
        let line = match Text::new("City:").with_help_message(":u toggles °C/°F, :q quits").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read input"),
        };

        match parse_prompt(&line) {
            PromptInput::Quit => break,
            PromptInput::ToggleUnit => {
                dash.toggle_unit();
                print!("{}", render(&dash.screen()));
            }
            PromptInput::Search(text) => {
                dash.submit(text);
                if dash.is_loading() {
                    drive(&mut dash, None).await;
                } else {
                    print!("{}", render(&dash.screen()));
                }
            }
        }
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
