//! Cosmetic mapping from conditions to a background and particle effects.

use crate::view_model::{ConditionCategory, CurrentView};

pub const DEFAULT_GRADIENT: &str = "linear-gradient(to right, #74ebd5, #ACB6E5)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Day,
    Night,
}

impl TimeOfDay {
    pub fn from_flag(is_day: bool) -> Self {
        if is_day { Self::Day } else { Self::Night }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    Clear(TimeOfDay),
    Clouds(TimeOfDay),
    Rain(TimeOfDay),
    Snow(TimeOfDay),
    Thunderstorm,
    Mist,
    #[default]
    Default,
}

impl Background {
    pub fn for_conditions(category: ConditionCategory, is_day: bool) -> Self {
        let time = TimeOfDay::from_flag(is_day);
        match category {
            ConditionCategory::Clear => Self::Clear(time),
            ConditionCategory::Clouds => Self::Clouds(time),
            ConditionCategory::Rain => Self::Rain(time),
            ConditionCategory::Snow => Self::Snow(time),
            ConditionCategory::Thunderstorm => Self::Thunderstorm,
            ConditionCategory::Mist => Self::Mist,
            ConditionCategory::Unknown => Self::Default,
        }
    }

    /// Style class names; empty for the gradient fallback.
    pub fn css_classes(self) -> Vec<&'static str> {
        match self {
            Self::Clear(t) => vec!["clear", t.as_str()],
            Self::Clouds(t) => vec!["clouds", t.as_str()],
            Self::Rain(t) => vec!["rain", t.as_str()],
            Self::Snow(t) => vec!["snow", t.as_str()],
            Self::Thunderstorm => vec!["thunderstorm"],
            Self::Mist => vec!["mist"],
            Self::Default => Vec::new(),
        }
    }
}

/// How many decorative particles of each kind to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Particles {
    pub clouds: u32,
    pub rain_drops: u32,
    pub snowflakes: u32,
}

impl Particles {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds == 0 && self.rain_drops == 0 && self.snowflakes == 0
    }

    /// Effects stack: every keyword present in the condition group adds its
    /// own layer. `compact` halves precipitation for small displays.
    pub fn for_condition(condition: &str, compact: bool) -> Self {
        let lower = condition.to_lowercase();
        let precip = |n: u32| if compact { n / 2 } else { n };
        let mut p = Self::none();

        if lower.contains("cloud") {
            p.clouds += 6;
        }
        if lower.contains("rain") || lower.contains("drizzle") {
            p.rain_drops += precip(100);
            p.clouds += 3;
        }
        if lower.contains("snow") {
            p.snowflakes += precip(80);
            p.clouds += 2;
        }
        if lower.contains("thunderstorm") {
            p.rain_drops += precip(120);
            p.clouds += 4;
        }
        p
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scene {
    pub background: Background,
    pub particles: Particles,
}

impl Scene {
    pub fn for_view(view: &CurrentView, compact: bool) -> Self {
        Self {
            background: Background::for_conditions(view.category, view.is_day),
            particles: Particles::for_condition(&view.condition_main, compact),
        }
    }

    /// Keep the backdrop, drop every particle.
    pub fn cleared(self) -> Self {
        Self { background: self.background, particles: Particles::none() }
    }
}
