//! Theme and list preferences persisted across launches.
//!
//! # Invariants
//! - Every preference has a default; unknown stored labels map to it.

use crate::model::query::{TaskFilter, TaskSort};
use serde::{Deserialize, Serialize};

/// Requested color scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    /// Follow the platform setting.
    #[default]
    System,
    Light,
    Dark,
}

/// Effective color scheme after resolving `ThemeMode::System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn resolve(self, system_is_dark: bool) -> Appearance {
        match self {
            Self::Light => Appearance::Light,
            Self::Dark => Appearance::Dark,
            Self::System if system_is_dark => Appearance::Dark,
            Self::System => Appearance::Light,
        }
    }
}

/// Accent tint applied to controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentColor {
    #[default]
    Blue,
    Green,
    Orange,
    Purple,
    Red,
}

impl AccentColor {
    pub const ALL: [AccentColor; 5] = [
        AccentColor::Blue,
        AccentColor::Green,
        AccentColor::Orange,
        AccentColor::Purple,
        AccentColor::Red,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Purple => "purple",
            Self::Red => "red",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|accent| accent.as_str() == value.trim().to_ascii_lowercase())
    }

    /// `#RRGGBB` value for the given appearance.
    pub fn hex(self, appearance: Appearance) -> &'static str {
        match (self, appearance) {
            (Self::Blue, Appearance::Light) => "#007AFF",
            (Self::Blue, Appearance::Dark) => "#0A84FF",
            (Self::Green, Appearance::Light) => "#34C759",
            (Self::Green, Appearance::Dark) => "#30D158",
            (Self::Orange, Appearance::Light) => "#FF9500",
            (Self::Orange, Appearance::Dark) => "#FF9F0A",
            (Self::Purple, Appearance::Light) => "#AF52DE",
            (Self::Purple, Appearance::Dark) => "#BF5AF2",
            (Self::Red, Appearance::Light) => "#FF3B30",
            (Self::Red, Appearance::Dark) => "#FF453A",
        }
    }
}

/// Persisted UI configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: ThemeMode,
    pub accent: AccentColor,
    pub filter: TaskFilter,
    pub sort: TaskSort,
}

#[cfg(test)]
mod tests {
    use super::{AccentColor, Appearance, ThemeMode};

    #[test]
    fn system_theme_follows_platform() {
        assert_eq!(ThemeMode::System.resolve(true), Appearance::Dark);
        assert_eq!(ThemeMode::System.resolve(false), Appearance::Light);
        assert_eq!(ThemeMode::Light.resolve(true), Appearance::Light);
    }

    #[test]
    fn accent_labels_roundtrip() {
        for accent in AccentColor::ALL {
            assert_eq!(AccentColor::parse(accent.as_str()), Some(accent));
        }
        assert_eq!(AccentColor::parse("teal"), None);
    }
}
