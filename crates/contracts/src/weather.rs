//! 天气预设

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Weather presets known to the simulator.
///
/// Each preset has an internal identifier (`HardRainNoon`) and the
/// human-readable form the simulator reports (`Hard Rain Noon`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeatherPreset {
    ClearNoon,
    CloudyNoon,
    WetNoon,
    WetCloudyNoon,
    MidRainyNoon,
    #[default]
    HardRainNoon,
    SoftRainNoon,
    ClearSunset,
    CloudySunset,
    WetSunset,
    WetCloudySunset,
    MidRainSunset,
    HardRainSunset,
    SoftRainSunset,
}

impl WeatherPreset {
    pub const ALL: [WeatherPreset; 14] = [
        Self::ClearNoon,
        Self::CloudyNoon,
        Self::WetNoon,
        Self::WetCloudyNoon,
        Self::MidRainyNoon,
        Self::HardRainNoon,
        Self::SoftRainNoon,
        Self::ClearSunset,
        Self::CloudySunset,
        Self::WetSunset,
        Self::WetCloudySunset,
        Self::MidRainSunset,
        Self::HardRainSunset,
        Self::SoftRainSunset,
    ];

    pub fn internal_name(&self) -> &'static str {
        match self {
            Self::ClearNoon => "ClearNoon",
            Self::CloudyNoon => "CloudyNoon",
            Self::WetNoon => "WetNoon",
            Self::WetCloudyNoon => "WetCloudyNoon",
            Self::MidRainyNoon => "MidRainyNoon",
            Self::HardRainNoon => "HardRainNoon",
            Self::SoftRainNoon => "SoftRainNoon",
            Self::ClearSunset => "ClearSunset",
            Self::CloudySunset => "CloudySunset",
            Self::WetSunset => "WetSunset",
            Self::WetCloudySunset => "WetCloudySunset",
            Self::MidRainSunset => "MidRainSunset",
            Self::HardRainSunset => "HardRainSunset",
            Self::SoftRainSunset => "SoftRainSunset",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ClearNoon => "Clear Noon",
            Self::CloudyNoon => "Cloudy Noon",
            Self::WetNoon => "Wet Noon",
            Self::WetCloudyNoon => "Wet Cloudy Noon",
            Self::MidRainyNoon => "Mid Rainy Noon",
            Self::HardRainNoon => "Hard Rain Noon",
            Self::SoftRainNoon => "Soft Rain Noon",
            Self::ClearSunset => "Clear Sunset",
            Self::CloudySunset => "Cloudy Sunset",
            Self::WetSunset => "Wet Sunset",
            Self::WetCloudySunset => "Wet Cloudy Sunset",
            Self::MidRainSunset => "Mid Rain Sunset",
            Self::HardRainSunset => "Hard Rain Sunset",
            Self::SoftRainSunset => "Soft Rain Sunset",
        }
    }
}

impl fmt::Display for WeatherPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Unknown weather preset name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weather preset: '{0}'")]
pub struct UnknownWeatherPreset(pub String);

impl FromStr for WeatherPreset {
    type Err = UnknownWeatherPreset;

    /// Accepts either the internal or the display form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.internal_name() == wanted || p.display_name() == wanted)
            .ok_or_else(|| UnknownWeatherPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_forms() {
        assert_eq!(
            "Hard Rain Noon".parse::<WeatherPreset>().unwrap(),
            WeatherPreset::HardRainNoon
        );
        assert_eq!(
            "HardRainNoon".parse::<WeatherPreset>().unwrap(),
            WeatherPreset::HardRainNoon
        );
        assert!("Sunny Midnight".parse::<WeatherPreset>().is_err());
    }

    #[test]
    fn test_default_is_hard_rain_noon() {
        assert_eq!(WeatherPreset::default(), WeatherPreset::HardRainNoon);
        assert_eq!(WeatherPreset::ALL.len(), 14);
    }
}
