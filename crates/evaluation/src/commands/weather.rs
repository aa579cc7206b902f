//! `weather` command implementation.

use anyhow::Result;
use contracts::WeatherPreset;

/// Print every preset in both accepted forms, with usage examples
pub fn run_weather() -> Result<()> {
    print!("{}", preset_listing());
    Ok(())
}

pub(crate) fn preset_listing() -> String {
    let mut out = String::from("\nAvailable CARLA Weather Presets:\n");
    out.push_str("================================\n");
    out.push_str("Here are the available presets you can use:\n");

    for preset in WeatherPreset::ALL {
        out.push_str(&format!(
            "--weather-preset={:<20} # CARLA's display name\n",
            preset.display_name()
        ));
        out.push_str(&format!(
            "--weather-preset={:<20} # No spaces version (also works)\n\n",
            preset.internal_name()
        ));
    }

    out.push_str("\nExample usage:\n");
    out.push_str("transfuser-eval evaluate --weather-preset=\"Hard Rain Noon\"\n");
    out.push_str("transfuser-eval evaluate --weather-preset=HardRainNoon\n\n");
    out.push_str(&format!(
        "NOTE: The default preset is {}\n",
        WeatherPreset::default().internal_name()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_contains_both_forms() {
        let text = preset_listing();
        assert!(text.contains("--weather-preset=Hard Rain Noon"));
        assert!(text.contains("--weather-preset=HardRainNoon"));
        assert!(text.contains("--weather-preset=SoftRainSunset"));
        assert!(text.contains("The default preset is HardRainNoon"));
    }
}
