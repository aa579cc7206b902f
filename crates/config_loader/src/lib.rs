//! # Config Loader
//!
//! Layered settings for the harness.
//!
//! Responsibilities:
//! - Provide built-in defaults for every settings group
//! - Parse TOML/JSON/YAML override files
//! - Merge overrides into defaults (mappings merge, everything else replaces)
//! - Validate the typed result
//! - Dotted-key lookup and saving of the merged tree
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let layered = ConfigLoader::load_from_path(Path::new("settings.yaml")).unwrap();
//! println!("port: {}", layered.settings().carla.port);
//! println!("fov: {:?}", layered.get("sensors.rgb_camera.fov"));
//! ```

mod merge;
mod parser;
mod settings;
mod validation;

pub use merge::{lookup, merge};
pub use parser::ConfigFormat;
pub use settings::{
    CameraSettings, CarlaSettings, LidarSettings, ModelSettings, SensorSettings, Settings,
    VisualizationSettings,
};

use std::path::{Path, PathBuf};

use contracts::ContractError;
use serde_json::Value;
use tracing::{debug, info};

/// Merged settings: the raw value tree plus its typed view.
///
/// The tree keeps keys the typed view does not know about, so dotted lookups
/// and saves see everything the user wrote.
#[derive(Debug, Clone)]
pub struct LayeredSettings {
    tree: Value,
    settings: Settings,
    source: Option<PathBuf>,
}

impl LayeredSettings {
    /// Typed settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Raw merged tree
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// File the overrides came from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Dotted-key lookup, e.g. `carla.port`
    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.tree, key)
    }

    /// Dotted-key lookup with a fallback
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// Save the merged tree.
    ///
    /// Without an explicit path the source file is overwritten. The format is
    /// chosen from the target extension.
    pub fn save(&self, path: Option<&Path>) -> Result<(), ContractError> {
        let target = path
            .or(self.source.as_deref())
            .ok_or_else(|| ContractError::config_parse("no config path specified"))?;
        let format = ConfigLoader::detect_format(target)?;
        let content = parser::serialize(&self.tree, format)?;
        std::fs::write(target, content)?;
        info!(path = %target.display(), "settings saved");
        Ok(())
    }
}

/// Configuration loader
///
/// Provides static methods to build layered settings from defaults, files or
/// strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Built-in defaults only
    pub fn defaults() -> LayeredSettings {
        let settings = Settings::default();
        LayeredSettings {
            tree: Self::default_tree(),
            settings,
            source: None,
        }
    }

    /// Load overrides from a file and merge them over the defaults.
    ///
    /// Automatically detects format from file extension.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<LayeredSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let mut layered = Self::load_from_str(&content, format)?;
        layered.source = Some(path.to_path_buf());
        info!(path = %path.display(), "settings loaded");
        Ok(layered)
    }

    /// Load overrides from a string and merge them over the defaults.
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LayeredSettings, ContractError> {
        let overlay = parser::parse(content, format)?;
        Self::from_overlay(overlay)
    }

    /// Merge an already parsed override tree over the defaults
    pub fn from_overlay(overlay: Value) -> Result<LayeredSettings, ContractError> {
        let mut tree = Self::default_tree();
        merge(&mut tree, overlay);
        debug!("settings overlay merged");

        let settings: Settings = serde_json::from_value(tree.clone()).map_err(|e| {
            ContractError::ConfigParse {
                message: format!("settings type error: {e}"),
                source: Some(Box::new(e)),
            }
        })?;
        validation::validate(&settings)?;

        Ok(LayeredSettings {
            tree,
            settings,
            source: None,
        })
    }
}

impl ConfigLoader {
    fn default_tree() -> Value {
        // Settings is plain data with string keys; serialization cannot fail.
        serde_json::to_value(Settings::default()).unwrap_or_default()
    }

    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_YAML: &str = r#"
carla:
  host: 192.168.1.20
  port: 2002
sensors:
  lidar:
    channels: 64
    range: 100.0
visualization:
  save_video: true
extra:
  note: kept
"#;

    #[test]
    fn test_defaults_match_typed_defaults() {
        let layered = ConfigLoader::defaults();
        assert_eq!(layered.settings(), &Settings::default());
        assert_eq!(layered.get("carla.host"), Some(&json!("localhost")));
        assert_eq!(layered.get("model.type"), Some(&json!("transfuser")));
    }

    #[test]
    fn test_user_values_override_defaults() {
        let layered = ConfigLoader::load_from_str(USER_YAML, ConfigFormat::Yaml).unwrap();
        let settings = layered.settings();
        assert_eq!(settings.carla.host, "192.168.1.20");
        assert_eq!(settings.carla.port, 2002);
        // untouched keys keep their defaults
        assert_eq!(settings.carla.timeout, 10.0);
        assert_eq!(settings.sensors.lidar.channels, 64);
        assert_eq!(settings.sensors.lidar.location, [0.0, 0.0, 2.5]);
        assert!(settings.visualization.save_video);
        assert!(settings.visualization.enabled);
    }

    #[test]
    fn test_unknown_keys_kept_in_tree() {
        let layered = ConfigLoader::load_from_str(USER_YAML, ConfigFormat::Yaml).unwrap();
        assert_eq!(layered.get("extra.note"), Some(&json!("kept")));
        let fallback = json!(5);
        assert_eq!(layered.get_or("extra.missing", &fallback), &json!(5));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let err = ConfigLoader::load_from_str("[carla]\nport = 0\n", ConfigFormat::Toml)
            .unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_type_mismatch_is_parse_error() {
        let err =
            ConfigLoader::load_from_str(r#"{"carla": {"port": "two"}}"#, ConfigFormat::Json)
                .unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, USER_YAML).unwrap();

        let layered = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(layered.source(), Some(path.as_path()));

        let saved = dir.path().join("saved.toml");
        layered.save(Some(&saved)).unwrap();
        let reloaded = ConfigLoader::load_from_path(&saved).unwrap();
        assert_eq!(reloaded.settings(), layered.settings());
        assert_eq!(reloaded.get("extra.note"), Some(&json!("kept")));
    }

    #[test]
    fn test_save_without_path_fails() {
        let err = ConfigLoader::defaults().save(None).unwrap_err();
        assert!(err.to_string().contains("no config path"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("settings.ini")).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}
